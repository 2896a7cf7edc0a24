//! Error types for routing and call construction.

use thiserror::Error;

use crate::call::OptionKey;

/// Result type for routing operations.
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors that can occur while building a call or dispatching it.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// No registered route matched the call.
    #[error("Invalid call: no route matches ({routes} routes evaluated)")]
    NoMatch { routes: usize },

    /// A route pattern entry is not a valid regular expression.
    #[error("Invalid pattern for option '{key}': {pattern}: {source}")]
    InvalidPattern {
        key: OptionKey,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The option template could not be parsed.
    #[error("Invalid option template: {0}")]
    InvalidTemplate(String),

    /// Invocation arguments could not be collected against a template.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A route table referenced a handler name that is not registered.
    #[error("Unknown handler: {0}")]
    UnknownHandler(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading standard input failed.
    #[error("Input error: {0}")]
    Input(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for RoutingError {
    fn from(err: serde_yaml::Error) -> Self {
        RoutingError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arguments_display() {
        let err = RoutingError::InvalidArguments("unexpected value".to_string());
        assert_eq!(err.to_string(), "Invalid arguments: unexpected value");
    }

    #[test]
    fn test_no_match_display() {
        let err = RoutingError::NoMatch { routes: 3 };
        assert_eq!(
            err.to_string(),
            "Invalid call: no route matches (3 routes evaluated)"
        );
    }

    #[test]
    fn test_invalid_pattern_keeps_source() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = RoutingError::InvalidPattern {
            key: OptionKey::from("a"),
            pattern: "(".to_string(),
            source,
        };

        assert!(err.to_string().starts_with("Invalid pattern for option 'a': ("));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: RoutingError = io.into();
        assert!(matches!(err, RoutingError::Input(_)));
    }
}
