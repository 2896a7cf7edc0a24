//! YAML route tables
//!
//! A route table declares the option template and an ordered list of routes,
//! each naming a handler from a [`HandlerRegistry`](crate::router::HandlerRegistry):
//!
//! ```yaml
//! template:
//!   short: "a:s"
//!   long: ["action:", "id:"]
//! routes:
//!   - name: delete
//!     handler: delete
//!     when:
//!       a: "^delete$"
//!       id: "^[0-9]+$"
//!   - handler: usage
//! ```
//!
//! `when` keys are option names or positional indices and keep their
//! declared order. String values, including `when` expressions, support
//! `${VAR:default}` expansion; write `$${...}` for a literal `${...}`.

use regex::{Captures, Regex};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

use crate::call::{OptionKey, OptionTemplate};
use crate::router::Pattern;
use crate::{Result, RoutingError};

/// Parsed route table document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteTable {
    /// Option template; raw positional mode when absent
    #[serde(default)]
    pub template: Option<TemplateConfig>,
    /// Routes in priority order
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Option template section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    #[serde(default)]
    pub short: String,
    #[serde(default)]
    pub long: Vec<String>,
}

impl TemplateConfig {
    pub fn to_template(&self) -> Result<OptionTemplate> {
        OptionTemplate::new(&self.short, &self.long)
    }
}

/// One route entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Name of a registered handler
    pub handler: String,
    /// Option requirements; empty means catch-all
    #[serde(default)]
    pub when: Mapping,
}

impl RouteConfig {
    /// Convert the `when` mapping into a pattern, keeping entry order.
    pub fn pattern(&self) -> Result<Pattern> {
        self.when
            .iter()
            .try_fold(Pattern::new(), |pattern, (key, expr)| {
                Ok(pattern.require(option_key(key)?, expression(key, expr)?))
            })
    }
}

impl RouteTable {
    /// Parse a table from YAML text, expanding environment variables.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut value: Value = serde_yaml::from_str(content)?;
        expand_variables(&mut value)?;
        Ok(serde_yaml::from_value(value)?)
    }

    /// Load a table from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RoutingError::Config(format!("Failed to read route table {:?}: {}", path, e))
        })?;

        let table = Self::from_yaml_str(&content).map_err(|e| match e {
            RoutingError::Config(msg) => {
                RoutingError::Config(format!("Failed to parse route table {:?}: {}", path, msg))
            }
            other => other,
        })?;
        tracing::debug!(path = %path.display(), routes = table.routes.len(), "Loaded route table");
        Ok(table)
    }

    /// Option template declared by the table, `None` for raw mode.
    pub fn option_template(&self) -> Result<Option<OptionTemplate>> {
        self.template.as_ref().map(TemplateConfig::to_template).transpose()
    }
}

fn option_key(key: &Value) -> Result<OptionKey> {
    match key {
        Value::String(name) => Ok(OptionKey::Name(name.clone())),
        Value::Number(n) => n
            .as_u64()
            .and_then(|index| usize::try_from(index).ok())
            .map(OptionKey::Index)
            .ok_or_else(|| {
                RoutingError::Config(format!("Positional option index must be non-negative: {}", n))
            }),
        other => Err(RoutingError::Config(format!(
            "Option names must be strings or indices, got {:?}",
            other
        ))),
    }
}

fn expression(key: &Value, expr: &Value) -> Result<String> {
    match expr {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(RoutingError::Config(format!(
            "Pattern for option {:?} must be a string, got {:?}",
            key, other
        ))),
    }
}

/// Expand `${VAR:default}` references in every string value, `when`
/// expressions included. `$${...}` is kept as the literal text `${...}`.
fn expand_variables(value: &mut Value) -> Result<()> {
    let re = Regex::new(r"\$(\$)?\{([^:}]+)(?::([^}]*))?\}")
        .map_err(|e| RoutingError::Config(e.to_string()))?;
    expand_with(&re, value);
    Ok(())
}

fn expand_with(re: &Regex, value: &mut Value) {
    match value {
        Value::String(s) => {
            if s.contains("${") {
                *s = re
                    .replace_all(s, |cap: &Captures| {
                        if cap.get(1).is_some() {
                            return cap[0][1..].to_string();
                        }
                        let default = cap.get(3).map(|m| m.as_str()).unwrap_or("");
                        std::env::var(&cap[2]).unwrap_or_else(|_| default.to_string())
                    })
                    .into_owned();
            }
        }
        Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                expand_with(re, v);
            }
        }
        Value::Sequence(seq) => {
            for item in seq.iter_mut() {
                expand_with(re, item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TABLE: &str = r#"
template:
  short: "a:s"
  long: ["action:", "id:"]
routes:
  - name: delete
    handler: remove
    when:
      a: "^delete$"
      id: "^[0-9]+$"
  - handler: usage
"#;

    #[test]
    fn test_parse_table() {
        let table = RouteTable::from_yaml_str(TABLE).unwrap();

        assert_eq!(table.routes.len(), 2);
        assert_eq!(table.routes[0].name.as_deref(), Some("delete"));
        assert_eq!(table.routes[0].handler, "remove");
        assert!(table.routes[1].when.is_empty());

        let template = table.option_template().unwrap().unwrap();
        assert_eq!(template.specs().len(), 4);
    }

    #[test]
    fn test_pattern_keeps_order() {
        let table = RouteTable::from_yaml_str(TABLE).unwrap();
        let pattern = table.routes[0].pattern().unwrap();

        let entries: Vec<(String, &str)> = pattern
            .entries()
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_str()))
            .collect();
        assert_eq!(entries, vec![("a".to_string(), "^delete$"), ("id".to_string(), "^[0-9]+$")]);
        assert!(table.routes[1].pattern().unwrap().is_empty());
    }

    #[test]
    fn test_positional_keys() {
        let table = RouteTable::from_yaml_str(
            r#"
routes:
  - handler: first
    when:
      0: "^-a$"
      1: 42
"#,
        )
        .unwrap();

        assert!(table.template.is_none());
        assert!(table.option_template().unwrap().is_none());

        let pattern = table.routes[0].pattern().unwrap();
        assert_eq!(pattern.entries()[0], (OptionKey::Index(0), "^-a$".to_string()));
        assert_eq!(pattern.entries()[1], (OptionKey::Index(1), "42".to_string()));
    }

    #[test]
    fn test_invalid_keys_and_values() {
        let table = RouteTable::from_yaml_str("routes:\n  - handler: h\n    when:\n      -1: x\n").unwrap();
        assert!(matches!(table.routes[0].pattern(), Err(RoutingError::Config(_))));

        let table = RouteTable::from_yaml_str("routes:\n  - handler: h\n    when:\n      a: [x]\n").unwrap();
        assert!(matches!(table.routes[0].pattern(), Err(RoutingError::Config(_))));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = RouteTable::from_yaml_str("routes:\n  - handler: h\n    callback: x\n");
        assert!(matches!(result, Err(RoutingError::Config(_))));
    }

    #[test]
    fn test_env_expansion() {
        std::env::set_var("CLI_ROUTER_TABLE_TEST_ACTION", "purge");
        let table = RouteTable::from_yaml_str(
            r#"
routes:
  - handler: h
    when:
      a: "^${CLI_ROUTER_TABLE_TEST_ACTION}$"
      b: "^${CLI_ROUTER_TABLE_TEST_MISSING_12345:fallback}$"
"#,
        )
        .unwrap();
        std::env::remove_var("CLI_ROUTER_TABLE_TEST_ACTION");

        let pattern = table.routes[0].pattern().unwrap();
        assert_eq!(pattern.entries()[0].1, "^purge$");
        assert_eq!(pattern.entries()[1].1, "^fallback$");
    }

    #[test]
    fn test_escaped_expansion_is_literal() {
        std::env::set_var("CLI_ROUTER_TABLE_TEST_ESCAPED", "expanded");
        let table = RouteTable::from_yaml_str(
            "routes:\n  - handler: h\n    when:\n      a: \"^$${CLI_ROUTER_TABLE_TEST_ESCAPED}\"\n",
        )
        .unwrap();
        std::env::remove_var("CLI_ROUTER_TABLE_TEST_ESCAPED");

        let pattern = table.routes[0].pattern().unwrap();
        assert_eq!(pattern.entries()[0].1, "^${CLI_ROUTER_TABLE_TEST_ESCAPED}");
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();

        let table = RouteTable::load(file.path()).unwrap();
        assert_eq!(table.routes.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = RouteTable::load("/nonexistent/cli-router/routes.yaml");
        assert!(matches!(result, Err(RoutingError::Config(_))));
    }
}
