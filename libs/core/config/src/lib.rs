pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Application environment (dev = local, prod = deployed)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Helper to load and parse environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Helper to load and parse environment variable or return error
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an environment variable, falling back to `default` when unset.
pub fn env_parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(env_parse_optional(key)?.unwrap_or(default))
}

/// Parse an environment variable that may be absent.
///
/// Unset and empty values both yield `None`.
pub fn env_parse_optional<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::ParseError {
                    key: key.to_string(),
                    details: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}

/// Parse a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`).
pub fn env_bool_or(key: &str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ParseError {
            key: key.to_string(),
            details: format!("'{}' is not a boolean", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });

        temp_env::with_var("APP_ENV", Some("Production"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("TEST_VAR", Some("test_value"), || {
            assert_eq!(env_or_default("TEST_VAR", "default"), "test_value");
        });
        temp_env::with_var_unset("MISSING_VAR", || {
            assert_eq!(env_or_default("MISSING_VAR", "default_value"), "default_value");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("MISSING_REQUIRED", || {
            let err = env_required("MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_parse_or() {
        temp_env::with_var("PARSE_PORT", Some("9000"), || {
            assert_eq!(env_parse_or::<u16>("PARSE_PORT", 1).unwrap(), 9000);
        });
        temp_env::with_var_unset("PARSE_PORT_UNSET", || {
            assert_eq!(env_parse_or::<u16>("PARSE_PORT_UNSET", 50051).unwrap(), 50051);
        });
        temp_env::with_var("PARSE_PORT_BAD", Some("not_a_number"), || {
            let err = env_parse_or::<u16>("PARSE_PORT_BAD", 1).unwrap_err();
            assert!(err.to_string().contains("PARSE_PORT_BAD"));
        });
    }

    #[test]
    fn test_env_parse_optional_empty_is_none() {
        temp_env::with_var("PARSE_EMPTY", Some("  "), || {
            assert_eq!(env_parse_optional::<u32>("PARSE_EMPTY").unwrap(), None);
        });
        temp_env::with_var("PARSE_SET", Some("10"), || {
            assert_eq!(env_parse_optional::<u32>("PARSE_SET").unwrap(), Some(10));
        });
    }

    #[test]
    fn test_env_bool_or() {
        temp_env::with_var("FLAG_TRUE", Some("True"), || {
            assert!(env_bool_or("FLAG_TRUE", false).unwrap());
        });
        temp_env::with_var("FLAG_ZERO", Some("0"), || {
            assert!(!env_bool_or("FLAG_ZERO", true).unwrap());
        });
        temp_env::with_var_unset("FLAG_UNSET", || {
            assert!(env_bool_or("FLAG_UNSET", true).unwrap());
        });
        temp_env::with_var("FLAG_BAD", Some("maybe"), || {
            let err = env_bool_or("FLAG_BAD", false).unwrap_err();
            assert!(err.to_string().contains("FLAG_BAD"));
        });
    }
}
