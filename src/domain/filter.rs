//! Domain filter expressions
//!
//! The host framework selects records with a prefix-notation list of
//! conditions:
//!
//! ```text
//! ["|", ["state", "=", "sale"], "!", ["amount_total", "<", 100]]
//! ```
//!
//! `&` and `|` take the next two expressions, `!` takes one, and adjacent
//! expressions at the top level are implicitly AND-ed. [`Domain::parse`]
//! turns the JSON form into a [`Domain`] tree that record sources either
//! evaluate in memory ([`Domain::matches`]) or translate to SQL.

use super::record::{FieldValue, HasDisplayName, Record, DATE_FORMAT, TIMESTAMP_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Like,
    ILike,
    NotLike,
    NotILike,
    EqLike,
    EqILike,
}

impl Operator {
    /// Operator as written in a domain
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Like => "like",
            Operator::ILike => "ilike",
            Operator::NotLike => "not like",
            Operator::NotILike => "not ilike",
            Operator::EqLike => "=like",
            Operator::EqILike => "=ilike",
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "=" | "==" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            "in" => Ok(Operator::In),
            "not in" => Ok(Operator::NotIn),
            "like" => Ok(Operator::Like),
            "ilike" => Ok(Operator::ILike),
            "not like" => Ok(Operator::NotLike),
            "not ilike" => Ok(Operator::NotILike),
            "=like" => Ok(Operator::EqLike),
            "=ilike" => Ok(Operator::EqILike),
            other => Err(format!("Unsupported domain operator: {other}")),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `[field, operator, value]` term
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Field name on the filtered model
    pub field: String,
    /// Comparison operator
    pub operator: Operator,
    /// Right-hand operand, as sent by the client
    pub value: Value,
}

/// Deepest operator nesting accepted by [`Domain::parse`]
///
/// Evaluation, SQL translation and drop all recurse over the tree.
pub const MAX_DEPTH: usize = 128;

/// Parsed filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    /// Matches every record (empty domain)
    All,
    /// Single condition
    Condition(Condition),
    /// Both sides must match
    And(Box<Domain>, Box<Domain>),
    /// Either side must match
    Or(Box<Domain>, Box<Domain>),
    /// Inner expression must not match
    Not(Box<Domain>),
}

impl Domain {
    /// Parses the JSON form of a domain
    ///
    /// # Errors
    ///
    /// Returns a message describing the first malformed element.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheets_export::domain::filter::Domain;
    /// use serde_json::json;
    ///
    /// let domain = Domain::parse(&json!([["active", "=", true], ["name", "ilike", "ali"]])).unwrap();
    /// assert!(!domain.is_all());
    /// assert!(Domain::parse(&json!([["active", "~", true]])).is_err());
    /// ```
    pub fn parse(value: &Value) -> Result<Self, String> {
        let tokens = value
            .as_array()
            .ok_or_else(|| "Domain must be a JSON array".to_string())?;

        let mut iter = tokens.iter();
        let mut expressions = Vec::new();
        while let Some(token) = iter.next() {
            expressions.push(Self::parse_expression(token, &mut iter, 0)?);
        }

        Ok(Self::conjunction(expressions))
    }

    /// Joins top-level terms into a balanced `And` tree
    ///
    /// Keeps the tree depth logarithmic in the number of terms, with the
    /// terms in their original left-to-right order.
    fn conjunction(mut terms: Vec<Domain>) -> Domain {
        while terms.len() > 1 {
            let mut paired = Vec::with_capacity(terms.len().div_ceil(2));
            let mut iter = terms.into_iter();
            while let Some(left) = iter.next() {
                paired.push(match iter.next() {
                    Some(right) => Domain::And(Box::new(left), Box::new(right)),
                    None => left,
                });
            }
            terms = paired;
        }
        terms.pop().unwrap_or(Domain::All)
    }

    fn parse_expression<'a, I>(
        token: &'a Value,
        rest: &mut I,
        depth: usize,
    ) -> Result<Self, String>
    where
        I: Iterator<Item = &'a Value>,
    {
        if matches!(token, Value::String(op) if op == "&" || op == "|" || op == "!")
            && depth >= MAX_DEPTH
        {
            return Err(format!(
                "Domain is nested too deeply (more than {MAX_DEPTH} operators)"
            ));
        }

        match token {
            Value::String(op) if op == "&" || op == "|" => {
                let left = Self::parse_operand(op, rest, depth + 1)?;
                let right = Self::parse_operand(op, rest, depth + 1)?;
                if op == "&" {
                    Ok(Domain::And(Box::new(left), Box::new(right)))
                } else {
                    Ok(Domain::Or(Box::new(left), Box::new(right)))
                }
            }
            Value::String(op) if op == "!" => {
                let inner = Self::parse_operand(op, rest, depth + 1)?;
                Ok(Domain::Not(Box::new(inner)))
            }
            Value::Array(term) => Self::parse_condition(term).map(Domain::Condition),
            other => Err(format!("Unexpected domain element: {other}")),
        }
    }

    fn parse_operand<'a, I>(op: &str, rest: &mut I, depth: usize) -> Result<Self, String>
    where
        I: Iterator<Item = &'a Value>,
    {
        let next = rest
            .next()
            .ok_or_else(|| format!("Operator '{op}' is missing an operand"))?;
        Self::parse_expression(next, rest, depth)
    }

    fn parse_condition(term: &[Value]) -> Result<Condition, String> {
        if term.len() != 3 {
            return Err(format!(
                "Domain term must have 3 elements, got {}",
                term.len()
            ));
        }

        let field = term[0]
            .as_str()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| format!("Domain term field must be a non-empty string: {}", term[0]))?;
        let operator = term[1]
            .as_str()
            .ok_or_else(|| format!("Domain term operator must be a string: {}", term[1]))?
            .parse::<Operator>()?;

        let value = term[2].clone();
        if matches!(operator, Operator::In | Operator::NotIn) && !value.is_array() {
            return Err(format!("Operator '{operator}' expects a list, got {value}"));
        }

        Ok(Condition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    /// Whether this domain matches every record
    pub fn is_all(&self) -> bool {
        matches!(self, Domain::All)
    }

    /// Field names referenced by the conditions, in order of appearance
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Domain::All => {}
            Domain::Condition(c) => {
                if !out.contains(&c.field.as_str()) {
                    out.push(&c.field);
                }
            }
            Domain::And(l, r) | Domain::Or(l, r) => {
                l.collect_fields(out);
                r.collect_fields(out);
            }
            Domain::Not(inner) => inner.collect_fields(out),
        }
    }

    /// Evaluates the domain against a record snapshot
    ///
    /// A condition on a field the record does not carry compares as if the
    /// field were unset.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Domain::All => true,
            Domain::Condition(c) => c.matches(record),
            Domain::And(l, r) => l.matches(record) && r.matches(record),
            Domain::Or(l, r) => l.matches(record) || r.matches(record),
            Domain::Not(inner) => !inner.matches(record),
        }
    }
}

impl Condition {
    fn matches(&self, record: &Record) -> bool {
        let field = record.get(&self.field).unwrap_or(&FieldValue::Null);

        match self.operator {
            Operator::Eq => value_eq(field, &self.value),
            Operator::Ne => !value_eq(field, &self.value),
            Operator::Lt => value_cmp(field, &self.value) == Some(Ordering::Less),
            Operator::Le => matches!(
                value_cmp(field, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Gt => value_cmp(field, &self.value) == Some(Ordering::Greater),
            Operator::Ge => matches!(
                value_cmp(field, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::In => self.in_list(field),
            Operator::NotIn => !self.in_list(field),
            Operator::Like => self.like(field, false, true),
            Operator::ILike => self.like(field, true, true),
            Operator::NotLike => !self.like(field, false, true),
            Operator::NotILike => !self.like(field, true, true),
            Operator::EqLike => self.like(field, false, false),
            Operator::EqILike => self.like(field, true, false),
        }
    }

    fn in_list(&self, field: &FieldValue) -> bool {
        self.value
            .as_array()
            .map(|items| items.iter().any(|item| value_eq(field, item)))
            .unwrap_or(false)
    }

    /// `like` wraps the operand in wildcards; `=like` uses it as a pattern
    fn like(&self, field: &FieldValue, case_insensitive: bool, wrap: bool) -> bool {
        let Some(operand) = json_as_text(&self.value) else {
            return false;
        };
        let haystack = match field {
            FieldValue::Null | FieldValue::Boolean(false) => return false,
            FieldValue::Reference(Some(r)) => r.display_name().unwrap_or_default(),
            other => other.to_string(),
        };

        let pattern = if wrap {
            format!("%{operand}%")
        } else {
            operand
        };
        like_regex(&pattern, case_insensitive)
            .map(|re| re.is_match(&haystack))
            .unwrap_or(false)
    }
}

/// Translates a SQL `LIKE` pattern (`%`, `_`) into an anchored regex
fn like_regex(pattern: &str, case_insensitive: bool) -> Option<Regex> {
    let mut expr = String::from(if case_insensitive { "(?is)^" } else { "(?s)^" });
    for c in pattern.chars() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).ok()
}

fn json_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_is_unset(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false))
}

fn value_eq(field: &FieldValue, operand: &Value) -> bool {
    match (field, operand) {
        (FieldValue::Boolean(b), Value::Bool(j)) => b == j,
        (FieldValue::Boolean(false), Value::Null) => true,
        (field, operand) if json_is_unset(operand) => !field.is_truthy() && !is_zero(field),
        (FieldValue::Reference(Some(r)), Value::Number(n)) => n.as_i64() == Some(r.id().get()),
        (FieldValue::Reference(Some(r)), Value::String(s)) => {
            r.display_name().as_deref() == Some(s.as_str())
        }
        (FieldValue::References(rs), Value::Number(n)) => {
            rs.iter().any(|r| n.as_i64() == Some(r.id().get()))
        }
        _ => value_cmp(field, operand) == Some(Ordering::Equal),
    }
}

fn is_zero(field: &FieldValue) -> bool {
    matches!(field, FieldValue::Integer(0)) || matches!(field, FieldValue::Float(f) if *f == 0.0)
}

fn value_cmp(field: &FieldValue, operand: &Value) -> Option<Ordering> {
    match (field, operand) {
        (FieldValue::Integer(i), Value::Number(n)) => (*i as f64).partial_cmp(&n.as_f64()?),
        (FieldValue::Float(x), Value::Number(n)) => x.partial_cmp(&n.as_f64()?),
        (FieldValue::Text(s), Value::String(j)) => Some(s.as_str().cmp(j.as_str())),
        (FieldValue::Date(d), Value::String(j)) => {
            let other = NaiveDate::parse_from_str(j.get(..10)?, DATE_FORMAT).ok()?;
            Some(d.cmp(&other))
        }
        (FieldValue::Timestamp(ts), Value::String(j)) => {
            let other = parse_timestamp(j)?;
            Some(ts.cmp(&other))
        }
        (FieldValue::Reference(Some(r)), Value::Number(n)) => {
            (r.id().get() as f64).partial_cmp(&n.as_f64()?)
        }
        _ => None,
    }
}

/// Parses `YYYY-MM-DD HH:MM:SS`, the `T`-separated form, or a bare date
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{ModelName, RecordId};
    use serde_json::json;

    fn order(id: i64) -> Record {
        Record::new(
            ModelName::new("sale.order").unwrap(),
            RecordId::new(id).unwrap(),
        )
    }

    fn sample() -> Record {
        order(5)
            .with_field("name", FieldValue::text("SO005"))
            .with_field("state", FieldValue::text("sale"))
            .with_field("amount_total", FieldValue::Float(250.0))
            .with_field("active", FieldValue::Boolean(true))
            .with_field("note", FieldValue::Null)
            .with_field(
                "date_order",
                FieldValue::Timestamp(parse_timestamp("2024-05-01 10:00:00").unwrap()),
            )
            .with_field(
                "partner_id",
                FieldValue::reference(
                    Record::new(
                        ModelName::new("res.partner").unwrap(),
                        RecordId::new(9).unwrap(),
                    )
                    .with_field("name", FieldValue::text("Alice")),
                ),
            )
    }

    #[test]
    fn test_parse_empty_domain() {
        assert_eq!(Domain::parse(&json!([])).unwrap(), Domain::All);
        assert!(Domain::All.matches(&sample()));
    }

    #[test]
    fn test_parse_implicit_and() {
        let domain = Domain::parse(&json!([["state", "=", "sale"], ["active", "=", true]])).unwrap();
        assert!(matches!(domain, Domain::And(_, _)));
        assert_eq!(domain.fields(), vec!["state", "active"]);
        assert!(domain.matches(&sample()));
    }

    #[test]
    fn test_parse_prefix_operators() {
        let domain = Domain::parse(&json!([
            "|",
            ["state", "=", "draft"],
            "!",
            ["amount_total", "<", 100]
        ]))
        .unwrap();
        assert!(matches!(domain, Domain::Or(_, _)));
        assert!(domain.matches(&sample()));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Domain::parse(&json!({"state": "sale"})).is_err());
        assert!(Domain::parse(&json!(["|", ["state", "=", "sale"]])).is_err());
        assert!(Domain::parse(&json!([["state", "="]])).is_err());
        assert!(Domain::parse(&json!([["state", "~", "sale"]])).is_err());
        assert!(Domain::parse(&json!([["id", "in", 5]])).is_err());
        assert!(Domain::parse(&json!([42])).is_err());
    }

    #[test]
    fn test_comparisons() {
        let record = sample();
        let check = |domain: Value| Domain::parse(&domain).unwrap().matches(&record);

        assert!(check(json!([["amount_total", ">", 100]])));
        assert!(check(json!([["amount_total", ">=", 250]])));
        assert!(!check(json!([["amount_total", "<", 250]])));
        assert!(check(json!([["state", "!=", "draft"]])));
        assert!(check(json!([["date_order", ">=", "2024-05-01"]])));
        assert!(!check(json!([["date_order", "<", "2024-04-30 00:00:00"]])));
    }

    #[test]
    fn test_unset_values() {
        let record = sample();
        let check = |domain: Value| Domain::parse(&domain).unwrap().matches(&record);

        assert!(check(json!([["note", "=", false]])));
        assert!(check(json!([["missing_field", "=", false]])));
        assert!(check(json!([["partner_id", "!=", false]])));
        assert!(!check(json!([["active", "=", false]])));
    }

    #[test]
    fn test_relational_comparisons() {
        let record = sample();
        let check = |domain: Value| Domain::parse(&domain).unwrap().matches(&record);

        assert!(check(json!([["partner_id", "=", 9]])));
        assert!(check(json!([["partner_id", "in", [1, 9]]])));
        assert!(check(json!([["partner_id", "ilike", "ali"]])));
        assert!(!check(json!([["partner_id", "not in", [9]]])));
    }

    #[test]
    fn test_like_operators() {
        let record = sample();
        let check = |domain: Value| Domain::parse(&domain).unwrap().matches(&record);

        assert!(check(json!([["name", "like", "O00"]])));
        assert!(!check(json!([["name", "like", "so00"]])));
        assert!(check(json!([["name", "ilike", "so00"]])));
        assert!(check(json!([["name", "not ilike", "xyz"]])));
        assert!(check(json!([["name", "=like", "SO__5"]])));
        assert!(!check(json!([["name", "=like", "SO"]])));
        assert!(check(json!([["name", "=ilike", "so%"]])));
        assert!(!check(json!([["note", "ilike", ""]])));
    }

    #[test]
    fn test_operator_round_trip_names() {
        for op in ["=", "!=", "<", "<=", ">", ">=", "in", "not in", "like", "=ilike"] {
            assert_eq!(op.parse::<Operator>().unwrap().as_str(), op);
        }
    }

    fn negations(count: usize) -> Value {
        let mut tokens = vec![json!("!"); count];
        tokens.push(json!(["active", "=", false]));
        Value::Array(tokens)
    }

    #[test]
    fn test_nesting_limit() {
        let domain = Domain::parse(&negations(MAX_DEPTH)).unwrap();
        assert!(!domain.matches(&sample()));

        let err = Domain::parse(&negations(MAX_DEPTH + 1)).unwrap_err();
        assert!(err.starts_with("Domain is nested too deeply"));
    }

    #[test]
    fn test_huge_operator_chain_is_rejected() {
        let err = Domain::parse(&negations(200_000)).unwrap_err();
        assert!(err.starts_with("Domain is nested too deeply"));

        let mut ors = vec![json!("|"); 200_000];
        ors.extend(std::iter::repeat(json!(["state", "=", "sale"])).take(200_001));
        assert!(Domain::parse(&Value::Array(ors)).is_err());
    }

    #[test]
    fn test_many_top_level_terms_stay_shallow() {
        let terms = vec![json!(["state", "=", "sale"]); 200_000];
        let domain = Domain::parse(&Value::Array(terms)).unwrap();

        assert!(domain.matches(&sample()));
        assert_eq!(domain.fields(), vec!["state"]);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-01-02 03:04:05").is_some());
        assert!(parse_timestamp("2024-01-02T03:04:05.123").is_some());
        assert!(parse_timestamp("2024-01-02").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }
}
