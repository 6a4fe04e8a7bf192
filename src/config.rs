use std::env;
use std::fmt;

/// bcrypt's own default work factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    Missing(&'static str),
    /// A variable is present but cannot be used.
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{} must be set", var),
            ConfigError::Invalid(var, reason) => write!(f, "{} is invalid: {}", var, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    /// Pre-shared key required in `x-api-key` on every `/api` route. No gate when `None`.
    pub api_key: Option<String>,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_port = match env::var("SERVER_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("SERVER_PORT", format!("'{}' is not a port", raw)))?,
            Err(_) => 8080,
        };

        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(raw) => {
                let cost: u32 = raw
                    .parse()
                    .map_err(|_| ConfigError::Invalid("BCRYPT_COST", format!("'{}' is not a number", raw)))?;
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError::Invalid("BCRYPT_COST", "must be between 4 and 31".into()));
                }
                cost
            }
            Err(_) => DEFAULT_BCRYPT_COST,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_port,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            api_key: env::var("API_KEY").ok().filter(|key| !key.is_empty()),
            bcrypt_cost,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(var)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    }

    const VARS: [&str; 6] = [
        "DATABASE_URL",
        "SERVER_PORT",
        "SERVER_HOST",
        "JWT_SECRET",
        "API_KEY",
        "BCRYPT_COST",
    ];

    // Runs `test_logic` with exactly the given variables set, restoring the environment afterwards.
    fn with_env<F>(vars: &[(&str, &str)], test_logic: F)
    where
        F: FnOnce(),
    {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let saved: Vec<(&str, Option<String>)> = VARS.iter().map(|v| (*v, env::var(v).ok())).collect();
        for var in VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_logic));

        for (key, value) in saved {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }

        if let Err(panic_payload) = result {
            std::panic::resume_unwind(panic_payload);
        }
    }

    #[test]
    fn test_config_from_env() {
        with_env(&[("DATABASE_URL", "postgres://test"), ("JWT_SECRET", "s3cret")], || {
            let config = Config::from_env().unwrap();

            assert_eq!(config.database_url, "postgres://test");
            assert_eq!(config.server_port, 8080);
            assert_eq!(config.server_host, "127.0.0.1");
            assert_eq!(config.jwt_secret, "s3cret");
            assert_eq!(config.api_key, None);
            assert_eq!(config.bcrypt_cost, DEFAULT_BCRYPT_COST);
            assert_eq!(config.server_url(), "http://127.0.0.1:8080");
        });

        with_env(
            &[
                ("DATABASE_URL", "postgres://test"),
                ("JWT_SECRET", "s3cret"),
                ("SERVER_PORT", "3000"),
                ("SERVER_HOST", "0.0.0.0"),
                ("API_KEY", "machine-key"),
                ("BCRYPT_COST", "4"),
            ],
            || {
                let config = Config::from_env().unwrap();

                assert_eq!(config.server_port, 3000);
                assert_eq!(config.server_host, "0.0.0.0");
                assert_eq!(config.api_key.as_deref(), Some("machine-key"));
                assert_eq!(config.bcrypt_cost, 4);
            },
        );
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        with_env(&[("DATABASE_URL", "postgres://test")], || {
            assert_eq!(Config::from_env().unwrap_err(), ConfigError::Missing("JWT_SECRET"));
        });

        with_env(&[("DATABASE_URL", "postgres://test"), ("JWT_SECRET", "  ")], || {
            assert_eq!(Config::from_env().unwrap_err(), ConfigError::Missing("JWT_SECRET"));
        });
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        with_env(
            &[
                ("DATABASE_URL", "postgres://test"),
                ("JWT_SECRET", "s3cret"),
                ("SERVER_PORT", "eighty"),
            ],
            || {
                assert!(matches!(
                    Config::from_env(),
                    Err(ConfigError::Invalid("SERVER_PORT", _))
                ));
            },
        );

        with_env(
            &[
                ("DATABASE_URL", "postgres://test"),
                ("JWT_SECRET", "s3cret"),
                ("BCRYPT_COST", "2"),
            ],
            || {
                assert!(matches!(
                    Config::from_env(),
                    Err(ConfigError::Invalid("BCRYPT_COST", _))
                ));
            },
        );
    }

    #[test]
    fn test_empty_api_key_disables_gate() {
        with_env(
            &[
                ("DATABASE_URL", "postgres://test"),
                ("JWT_SECRET", "s3cret"),
                ("API_KEY", ""),
            ],
            || {
                assert_eq!(Config::from_env().unwrap().api_key, None);
            },
        );
    }
}
