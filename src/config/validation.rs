//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts > 0, timeouts > 0)
//! - Check URL shapes before any network call
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: EngineConfig → Result<(), Vec<ValidationError>>

use crate::config::schema::EngineConfig;

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate an engine configuration, collecting every error found.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if url::Url::parse(&config.network.horizon_url).is_err() {
        errors.push(ValidationError {
            field: "network.horizon_url".into(),
            message: format!("not a valid URL: '{}'", config.network.horizon_url),
        });
    }
    if config.network.passphrase.is_empty() {
        errors.push(ValidationError {
            field: "network.passphrase".into(),
            message: "must not be empty".into(),
        });
    }
    if let Some(friendbot) = &config.network.friendbot_url {
        if url::Url::parse(friendbot).is_err() {
            errors.push(ValidationError {
                field: "network.friendbot_url".into(),
                message: format!("not a valid URL: '{}'", friendbot),
            });
        }
    } else if config.network.kind.is_test() {
        errors.push(ValidationError {
            field: "network.friendbot_url".into(),
            message: "required on the test network".into(),
        });
    }

    if let Some(hex_key) = &config.custody.master_key_hex {
        if hex::decode(hex_key).map(|k| k.len()) != Ok(32) {
            errors.push(ValidationError {
                field: "custody.master_key_hex".into(),
                message: "must be 64 hex characters (32 bytes)".into(),
            });
        }
    } else if config.custody.master_key_env.is_empty() {
        errors.push(ValidationError {
            field: "custody.master_key_env".into(),
            message: "must name an environment variable when no inline key is set".into(),
        });
    }

    for (field, value) in [
        ("retries.trustline_attempts", config.retries.trustline_attempts),
        ("retries.detect_attempts", config.retries.detect_attempts),
    ] {
        if value == 0 {
            errors.push(ValidationError {
                field: field.into(),
                message: "must be at least 1".into(),
            });
        }
    }

    if config.timeouts.horizon_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.horizon_secs".into(),
            message: "must be at least 1".into(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EngineConfig::default();
        config.network.horizon_url = "not a url".into();
        config.network.passphrase = String::new();
        config.retries.detect_attempts = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "network.horizon_url"));
        assert!(errors.iter().any(|e| e.field == "network.passphrase"));
        assert!(errors.iter().any(|e| e.field == "retries.detect_attempts"));
    }

    #[test]
    fn test_inline_master_key_length() {
        let mut config = EngineConfig::default();
        config.custody.master_key_hex = Some("abcd".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "custody.master_key_hex"));

        config.custody.master_key_hex = Some("11".repeat(32));
        assert!(validate_config(&config).is_ok());
    }
}
