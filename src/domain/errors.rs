//! Domain error types
//!
//! This module defines the error hierarchy for Strata. All errors are
//! domain-specific and don't expose third-party types through the public API.

use thiserror::Error;

/// Main Strata error type
///
/// This is the primary error type used throughout the library. Every fatal
/// condition in the resolution pipeline surfaces as one of these variants at
/// configuration-load time, before the application begins serving.
#[derive(Debug, Error)]
pub enum StrataError {
    /// A mandatory well-known file is absent while the host believes it is
    /// running in a managed datacenter. Never retried internally.
    #[error("Missing host configuration: {0}")]
    MissingConfig(String),

    /// Configuration-related errors (missing mandatory default layer,
    /// malformed documents, invalid reader state)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A declared key's raw value could not be converted to its declared type
    #[error("Failed to convert {key}: {message}")]
    Conversion { key: String, message: String },

    /// A declared key resolved to nil with `allow_nil` unset
    #[error("{0} is required but is not present")]
    RequiredKey(String),

    /// Converted value not in the permitted enum set
    #[error("unexpected {key}: {value}, expected one of {expected:?}")]
    UnexpectedValue {
        key: String,
        value: String,
        expected: Vec<String>,
    },

    /// Object store failures (connection, timeout); not-found is never an
    /// error and resolves to `None` at the call site instead
    #[error("Object store error: {0}")]
    ObjectStore(String),

    /// Secrets vault failures
    #[error("Secrets vault error: {0}")]
    SecretsVault(String),

    /// Instance metadata service failures, including timeouts
    #[error("Metadata service error: {0}")]
    Metadata(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for StrataError {
    fn from(err: std::io::Error) -> Self {
        StrataError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for StrataError {
    fn from(err: serde_json::Error) -> Self {
        StrataError::Serialization(err.to_string())
    }
}

// Conversion from YAML parse errors; malformed layer documents are fatal
impl From<serde_yaml::Error> for StrataError {
    fn from(err: serde_yaml::Error) -> Self {
        StrataError::Configuration(format!("YAML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_display() {
        let err = StrataError::MissingConfig("/etc/strata/info/env".to_string());
        assert_eq!(
            err.to_string(),
            "Missing host configuration: /etc/strata/info/env"
        );
    }

    #[test]
    fn test_required_key_display() {
        let err = StrataError::RequiredKey("database_host".to_string());
        assert_eq!(
            err.to_string(),
            "database_host is required but is not present"
        );
    }

    #[test]
    fn test_unexpected_value_display() {
        let err = StrataError::UnexpectedValue {
            key: "tier".to_string(),
            value: "gold".to_string(),
            expected: vec!["low".to_string(), "high".to_string()],
        };
        assert!(err.to_string().contains("unexpected tier: gold"));
        assert!(err.to_string().contains("low"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: StrataError = io_err.into();
        assert!(matches!(err, StrataError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: StrataError = json_err.into();
        assert!(matches!(err, StrataError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [unclosed").unwrap_err();
        let err: StrataError = yaml_err.into();
        assert!(matches!(err, StrataError::Configuration(_)));
        assert!(err.to_string().contains("YAML parse error"));
    }

    #[test]
    fn test_strata_error_implements_std_error() {
        let err = StrataError::Configuration("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
