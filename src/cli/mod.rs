//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for sheets-export using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// sheets-export - Google Sheets export for ERP records
#[derive(Parser, Debug)]
#[command(name = "sheets-export")]
#[command(version, about, long_about = None)]
#[command(author = "Sheets Export Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sheets-export.toml", env = "SHEETS_EXPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SHEETS_EXPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export records to the configured spreadsheet
    Export(commands::export::ExportArgs),

    /// Serve the export endpoint over HTTP
    Serve(commands::serve::ServeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from(["sheets-export", "export", "--request", "req.json"]);
        assert_eq!(cli.config, "sheets-export.toml");
        match cli.command {
            Commands::Export(args) => assert_eq!(args.request.as_deref(), Some("req.json")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["sheets-export", "--config", "custom.toml", "serve"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Serve(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["sheets-export", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_request_conflicts_with_flags() {
        let result = Cli::try_parse_from([
            "sheets-export",
            "export",
            "--request",
            "req.json",
            "--model",
            "res.partner",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["sheets-export", "init", "--with-examples"]);
        assert!(matches!(cli.command, Commands::Init(ref args) if args.with_examples));
    }
}
