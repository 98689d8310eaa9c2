//! Configuration for the NourishNet API service.

use std::str::FromStr;
use std::time::Duration;

use nourish_core::DeliveryConfig;
use nourish_db::PoolOptions;

/// NourishNet API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Connection pool tuning
    pub pool: PoolOptions,
    /// Delivery engine configuration
    pub delivery: DeliveryConfig,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Database
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let pool = PoolOptions {
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout: Duration::from_secs(parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?),
        };

        // Server
        let http_port = parse_or(&lookup, "HTTP_PORT", 8080)?;
        let request_timeout_secs: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;

        // Delivery listings
        let defaults = DeliveryConfig::new();
        let delivery = DeliveryConfig::new().with_list_limits(
            parse_or(&lookup, "DELIVERY_DEFAULT_LIST_LIMIT", defaults.default_list_limit)?,
            parse_or(&lookup, "DELIVERY_MAX_LIST_LIMIT", defaults.max_list_limit)?,
        );

        // Metrics
        let metrics_enabled = lookup("METRICS_ENABLED")
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        Ok(Self {
            http_port,
            database_url,
            pool,
            delivery,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
