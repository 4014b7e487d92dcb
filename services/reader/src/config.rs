//! services/reader/src/config.rs
//!
//! Defines the service's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// How often an active reading session pushes an accrual update.
    pub heartbeat_interval: Duration,
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for
    /// development, but this is skipped in test environments to ensure
    /// tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let heartbeat_interval =
            heartbeat_interval(std::env::var("READER_HEARTBEAT_SECS").ok())?;

        let allowed_origin = std::env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            heartbeat_interval,
            allowed_origin,
        })
    }
}

/// Parses the heartbeat override, defaulting to the tracker's own cadence.
fn heartbeat_interval(var: Option<String>) -> Result<Duration, ConfigError> {
    match var {
        Some(s) => s.parse::<u64>().map(Duration::from_secs).map_err(|_| {
            ConfigError::InvalidValue(
                "READER_HEARTBEAT_SECS".to_string(),
                format!("'{}' is not a number of seconds", s),
            )
        }),
        None => Ok(shelfside_core::tracker::HEARTBEAT_INTERVAL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_defaults_to_the_tracker_cadence() {
        assert_eq!(
            heartbeat_interval(None).unwrap(),
            shelfside_core::tracker::HEARTBEAT_INTERVAL
        );
    }

    #[test]
    fn heartbeat_override_is_parsed_as_seconds() {
        assert_eq!(
            heartbeat_interval(Some("45".to_string())).unwrap(),
            Duration::from_secs(45)
        );
        assert!(heartbeat_interval(Some("soon".to_string())).is_err());
    }
}
