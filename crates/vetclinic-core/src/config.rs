//! Runtime configuration.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | VETCLINIC_DB_PATH | vetclinic.db | SQLite database file |
//! | VETCLINIC_LOG_LEVEL | info | Log filter when `RUST_LOG` is unset |
//! | VETCLINIC_LOG_DIR | (none) | Directory for daily log files |
//! | VETCLINIC_DEFAULT_RATE | 1 | Bs per USD used until clinic settings hold a rate |

use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Database path must not be empty")]
    EmptyDbPath,

    #[error("Default exchange rate must be a positive number, got {0}")]
    InvalidRate(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClinicConfig {
    pub db_path: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub default_exchange_rate: f64,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            db_path: "vetclinic.db".into(),
            log_level: "info".into(),
            log_dir: None,
            default_exchange_rate: 1.0,
        }
    }
}

impl ClinicConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            db_path: lookup("VETCLINIC_DB_PATH").unwrap_or(defaults.db_path),
            log_level: lookup("VETCLINIC_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: lookup("VETCLINIC_LOG_DIR").filter(|d| !d.is_empty()),
            default_exchange_rate: lookup("VETCLINIC_DEFAULT_RATE")
                .and_then(|r| r.trim().parse().ok())
                .unwrap_or(defaults.default_exchange_rate),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.trim().is_empty() {
            return Err(ConfigError::EmptyDbPath);
        }
        if !self.default_exchange_rate.is_finite() || self.default_exchange_rate <= 0.0 {
            return Err(ConfigError::InvalidRate(self.default_exchange_rate));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClinicConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClinicConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = ClinicConfig::from_lookup(lookup(&[
            ("VETCLINIC_DB_PATH", "/data/clinic.db"),
            ("VETCLINIC_LOG_LEVEL", "debug"),
            ("VETCLINIC_LOG_DIR", "/var/log/vetclinic"),
            ("VETCLINIC_DEFAULT_RATE", "36.5"),
        ]));
        assert_eq!(config.db_path, "/data/clinic.db");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/vetclinic"));
        assert_eq!(config.default_exchange_rate, 36.5);
    }

    #[test]
    fn test_unparseable_rate_falls_back() {
        let config = ClinicConfig::from_lookup(lookup(&[("VETCLINIC_DEFAULT_RATE", "abc")]));
        assert_eq!(config.default_exchange_rate, 1.0);
    }

    #[test]
    fn test_validate() {
        let config = ClinicConfig {
            default_exchange_rate: 0.0,
            ..ClinicConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidRate(0.0)));

        let config = ClinicConfig {
            db_path: " ".into(),
            ..ClinicConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyDbPath));
    }
}
