//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{ParameterSourceKind, RecordSourceKind, SheetsExportConfig, ValueInputOption};
use super::secret::secret_string;
use crate::domain::errors::SheetsExportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "SHEETS_EXPORT";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into SheetsExportConfig
/// 4. Applies environment variable overrides (SHEETS_EXPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file is missing or unreadable, a
/// referenced variable is unset, the TOML is malformed or validation fails.
///
/// # Examples
///
/// ```no_run
/// use sheets_export::config::loader::load_config;
///
/// let config = load_config("sheets-export.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SheetsExportConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SheetsExportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SheetsExportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses and validates configuration text
///
/// Same pipeline as [`load_config`] minus the file read.
pub fn parse_config(contents: &str) -> Result<SheetsExportConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: SheetsExportConfig = toml::from_str(&contents)
        .map_err(|e| SheetsExportError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        SheetsExportError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SheetsExportError::Configuration(format!("Invalid placeholder pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(SheetsExportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn env_var(section: &str, key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}_{section}_{key}")).ok()
}

fn parse_env<T: std::str::FromStr>(section: &str, key: &str) -> Result<Option<T>> {
    match env_var(section, key) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            SheetsExportError::Configuration(format!(
                "Invalid value '{raw}' for {ENV_PREFIX}_{section}_{key}"
            ))
        }),
        None => Ok(None),
    }
}

/// Applies environment variable overrides using the SHEETS_EXPORT_* prefix
///
/// Environment variables follow the pattern: SHEETS_EXPORT_<SECTION>_<KEY>
/// For example: SHEETS_EXPORT_SHEETS_TIMEOUT_SECONDS,
/// SHEETS_EXPORT_POSTGRESQL_CONNECTION_STRING
fn apply_env_overrides(config: &mut SheetsExportConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env_var("APPLICATION", "LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Parameter overrides
    if let Some(val) = env_var("PARAMETERS", "SOURCE") {
        config.parameters.source = match val.to_lowercase().as_str() {
            "static" => ParameterSourceKind::Static,
            "postgresql" => ParameterSourceKind::PostgreSQL,
            other => {
                return Err(SheetsExportError::Configuration(format!(
                    "Invalid parameters.source '{other}'. Must be one of: static, postgresql"
                )))
            }
        };
    }
    if let Some(val) = env_var("PARAMETERS", "CREDENTIALS_KEY") {
        config.parameters.credentials_key = val;
    }
    if let Some(val) = env_var("PARAMETERS", "SPREADSHEET_ID_KEY") {
        config.parameters.spreadsheet_id_key = val;
    }
    // Direct values for the two export parameters
    if let Some(val) = env_var("PARAMETERS", "CREDENTIALS_JSON") {
        let key = config.parameters.credentials_key.clone();
        config.parameters.values.insert(key, secret_string(val));
    }
    if let Some(val) = env_var("PARAMETERS", "SPREADSHEET_ID") {
        let key = config.parameters.spreadsheet_id_key.clone();
        config.parameters.values.insert(key, secret_string(val));
    }

    // Record source overrides
    if let Some(val) = env_var("RECORDS", "SOURCE") {
        config.records.source = match val.to_lowercase().as_str() {
            "memory" => RecordSourceKind::Memory,
            "postgresql" => RecordSourceKind::PostgreSQL,
            other => {
                return Err(SheetsExportError::Configuration(format!(
                    "Invalid records.source '{other}'. Must be one of: memory, postgresql"
                )))
            }
        };
    }
    if let Some(val) = env_var("RECORDS", "DATASET_PATH") {
        config.records.dataset_path = Some(val);
    }

    // PostgreSQL overrides (only if PostgreSQL is configured)
    if let Some(ref mut pg_config) = config.postgresql {
        if let Some(val) = env_var("POSTGRESQL", "CONNECTION_STRING") {
            pg_config.connection_string = secret_string(val);
        }
        if let Some(max) = parse_env("POSTGRESQL", "MAX_CONNECTIONS")? {
            pg_config.max_connections = max;
        }
        if let Some(timeout) = parse_env("POSTGRESQL", "STATEMENT_TIMEOUT_SECONDS")? {
            pg_config.statement_timeout_seconds = timeout;
        }
    }

    // Sheets overrides
    if let Some(val) = env_var("SHEETS", "API_BASE_URL") {
        config.sheets.api_base_url = val;
    }
    if let Some(val) = env_var("SHEETS", "TOKEN_URI") {
        config.sheets.token_uri = Some(val);
    }
    if let Some(timeout) = parse_env("SHEETS", "TIMEOUT_SECONDS")? {
        config.sheets.timeout_seconds = timeout;
    }
    if let Some(val) = env_var("SHEETS", "VALUE_INPUT_OPTION") {
        config.sheets.value_input_option = match val.to_uppercase().as_str() {
            "USER_ENTERED" => ValueInputOption::UserEntered,
            "RAW" => ValueInputOption::Raw,
            other => {
                return Err(SheetsExportError::Configuration(format!(
                    "Invalid sheets.value_input_option '{other}'. Must be one of: USER_ENTERED, RAW"
                )))
            }
        };
    }

    // Server overrides
    if let Some(val) = env_var("SERVER", "BIND_ADDRESS") {
        config.server.bind_address = val;
    }
    if let Some(val) = env_var("SERVER", "API_TOKEN") {
        config.server.api_token = Some(secret_string(val));
    }

    // Logging overrides
    if let Some(enabled) = parse_env("LOGGING", "LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Some(val) = env_var("LOGGING", "LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(json) = parse_env("LOGGING", "JSON")? {
        config.logging.json = json;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("SHEETS_LOADER_TEST_VAR", "test_value");
        let input = "api_token = \"${SHEETS_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "api_token = \"test_value\"");
        std::env::remove_var("SHEETS_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("SHEETS_LOADER_MISSING_VAR");
        let input = "api_token = \"${SHEETS_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("SHEETS_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# token = \"${SHEETS_LOADER_COMMENTED_VAR}\"\nlog_level = \"info\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${SHEETS_LOADER_COMMENTED_VAR}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-sheets-export.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[parameters]
source = "static"

[parameters.values]
"google_sheets.spreadsheet_id" = "1AbCdEf"

[records]
source = "memory"
dataset_path = "records.json"

[sheets]
value_input_option = "RAW"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.sheets.value_input_option, ValueInputOption::Raw);
        assert_eq!(
            config.parameters.values["google_sheets.spreadsheet_id"].expose_secret(),
            "1AbCdEf"
        );
    }

    #[test]
    fn test_parse_config_rejects_invalid() {
        let result = parse_config("[application]\nlog_level = \"loud\"\n[records]\ndataset_path = \"x.json\"\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("validation failed"));
    }
}
