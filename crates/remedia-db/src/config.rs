//! Database settings module.
//!
//! Settings are loaded from environment variables; the database path is
//! required, pool sizing falls back to defaults. The loaded settings are
//! turned into a [`crate::DbConfig`] for pool construction.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::pool::DbConfig;

/// Environment variable naming the SQLite database file.
pub const ENV_DATABASE_PATH: &str = "REMEDIA_DATABASE_PATH";

/// Database settings loaded from the environment.
#[derive(Debug, Clone)]
pub struct DbSettings {
    /// Path to the SQLite database file.
    pub database_path: String,

    /// Maximum number of pooled connections.
    pub max_connections: u32,

    /// Minimum number of pooled connections kept alive.
    pub min_connections: u32,

    /// Connection acquire timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl DbSettings {
    /// Loads settings from environment variables.
    ///
    /// ## Variables
    /// - `REMEDIA_DATABASE_PATH` (required) - SQLite file path
    /// - `REMEDIA_DB_MAX_CONNECTIONS` (default: 5)
    /// - `REMEDIA_DB_MIN_CONNECTIONS` (default: 1)
    /// - `REMEDIA_DB_CONNECT_TIMEOUT_SECS` (default: 30)
    ///
    /// A missing database path is a hard configuration error; everything
    /// else has a sensible default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_path = env::var(ENV_DATABASE_PATH)
            .map_err(|_| ConfigError::MissingRequired(ENV_DATABASE_PATH.to_string()))?;

        let settings = DbSettings {
            database_path,

            max_connections: env::var("REMEDIA_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("REMEDIA_DB_MAX_CONNECTIONS".to_string()))?,

            min_connections: env::var("REMEDIA_DB_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("REMEDIA_DB_MIN_CONNECTIONS".to_string()))?,

            connect_timeout_secs: env::var("REMEDIA_DB_CONNECT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("REMEDIA_DB_CONNECT_TIMEOUT_SECS".to_string())
                })?,
        };

        Ok(settings)
    }

    /// Converts the settings into a pool configuration.
    pub fn into_db_config(self) -> DbConfig {
        DbConfig::new(self.database_path)
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
    }
}

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Environment-variable tests mutate process state; they set distinct
    // variables and restore them to stay order-independent.

    #[test]
    fn test_missing_path_is_hard_error() {
        let saved = env::var(ENV_DATABASE_PATH).ok();
        env::remove_var(ENV_DATABASE_PATH);

        let result = DbSettings::from_env();
        assert!(matches!(result, Err(ConfigError::MissingRequired(_))));

        if let Some(value) = saved {
            env::set_var(ENV_DATABASE_PATH, value);
        }
    }

    #[test]
    fn test_into_db_config_carries_settings() {
        let settings = DbSettings {
            database_path: "/tmp/remedia.db".to_string(),
            max_connections: 8,
            min_connections: 2,
            connect_timeout_secs: 10,
        };

        let config = settings.into_db_config();
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }
}
