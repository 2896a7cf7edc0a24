//! Router settings loaded from environment variables
//!
//! | Variable | Meaning |
//! | --- | --- |
//! | `CLI_ROUTER_TABLE` | Path to a YAML route table |
//! | `CLI_ROUTER_CASE_INSENSITIVE` | Compile every route pattern case-insensitively |

use std::env;
use std::path::PathBuf;

use crate::{Result, RoutingError};

/// Default prefix for settings variables.
pub const ENV_PREFIX: &str = "CLI_ROUTER_";

/// Settings applied when routes are registered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterSettings {
    /// Route table to load, if any
    pub table_path: Option<PathBuf>,
    /// Match every pattern ignoring case
    pub case_insensitive: bool,
}

impl RouterSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_path = Some(path.into());
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Load settings from `CLI_ROUTER_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Load settings from variables named `{prefix}TABLE` and `{prefix}CASE_INSENSITIVE`.
    ///
    /// Booleans accept `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off` in any case.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(path) = read_var(prefix, "TABLE")? {
            settings.table_path = Some(PathBuf::from(path));
        }

        let key = format!("{}CASE_INSENSITIVE", prefix);
        if let Some(flag) = read_var(prefix, "CASE_INSENSITIVE")? {
            settings.case_insensitive = match flag.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => {
                    return Err(RoutingError::Config(format!(
                        "{} must be a boolean, got {:?}",
                        key, flag
                    )))
                }
            };
        }

        Ok(settings)
    }
}

/// `None` when unset; non-UTF-8 content is a configuration error.
fn read_var(prefix: &str, name: &str) -> Result<Option<String>> {
    let key = format!("{}{}", prefix, name);
    match env::var(&key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(RoutingError::Config(format!(
            "{} is not valid UTF-8",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let settings = RouterSettings::from_env_with_prefix("CLI_ROUTER_TEST_UNSET_").unwrap();
        assert_eq!(settings, RouterSettings::default());
    }

    #[test]
    fn test_from_env() {
        env::set_var("CLI_ROUTER_TEST_A_TABLE", "/etc/routes.yaml");
        env::set_var("CLI_ROUTER_TEST_A_CASE_INSENSITIVE", "yes");

        let settings = RouterSettings::from_env_with_prefix("CLI_ROUTER_TEST_A_").unwrap();
        assert_eq!(settings.table_path, Some(PathBuf::from("/etc/routes.yaml")));
        assert!(settings.case_insensitive);

        env::remove_var("CLI_ROUTER_TEST_A_TABLE");
        env::remove_var("CLI_ROUTER_TEST_A_CASE_INSENSITIVE");
    }

    #[test]
    fn test_invalid_bool() {
        env::set_var("CLI_ROUTER_TEST_B_CASE_INSENSITIVE", "maybe");
        let result = RouterSettings::from_env_with_prefix("CLI_ROUTER_TEST_B_");
        assert!(matches!(result, Err(RoutingError::Config(_))));
        env::remove_var("CLI_ROUTER_TEST_B_CASE_INSENSITIVE");
    }

    #[test]
    fn test_case_insensitive_spellings() {
        let test_cases = vec![("TRUE", true), ("on", true), ("0", false), ("Off", false)];

        for (value, expected) in test_cases {
            env::set_var("CLI_ROUTER_TEST_C_CASE_INSENSITIVE", value);
            let settings = RouterSettings::from_env_with_prefix("CLI_ROUTER_TEST_C_").unwrap();
            assert_eq!(settings.case_insensitive, expected, "Failed for value: {}", value);
        }

        env::remove_var("CLI_ROUTER_TEST_C_CASE_INSENSITIVE");
    }

    #[test]
    fn test_builder() {
        let settings = RouterSettings::new()
            .with_table_path("routes.yaml")
            .with_case_insensitive(true);
        assert_eq!(settings.table_path, Some(PathBuf::from("routes.yaml")));
        assert!(settings.case_insensitive);
    }
}
