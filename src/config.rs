// config.rs
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_PAYMENT_API_URL: &str = "https://api.escrow-gateway.dev/v1";
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 300;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    // Payment gateway; without a key the mock provider is used
    pub payment_secret_key: Option<String>,
    pub payment_api_url: String,
    pub bridge_reconcile_interval_secs: u64,
    pub log_level: String,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any name -> value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections =
            parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let bridge_reconcile_interval_secs = parse_or(
            &lookup,
            "BRIDGE_RECONCILE_INTERVAL_SECS",
            DEFAULT_RECONCILE_INTERVAL_SECS,
        )?;
        if bridge_reconcile_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "BRIDGE_RECONCILE_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let payment_secret_key = lookup("PAYMENT_SECRET_KEY").filter(|v| !v.trim().is_empty());
        let payment_api_url =
            lookup("PAYMENT_API_URL").unwrap_or_else(|| DEFAULT_PAYMENT_API_URL.to_string());
        let log_level =
            lookup("RUST_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Config {
            database_url,
            database_max_connections,
            payment_secret_key,
            payment_api_url,
            bridge_reconcile_interval_secs,
            log_level,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
