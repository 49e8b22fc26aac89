use std::{env, net::SocketAddr, path::PathBuf};

use exchange::BybitConfig;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_RETENTION_DAYS: u64 = 7;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process-wide settings, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub exchange: BybitConfig,
    pub testnet: bool,
    pub webhook_secret: String,
    pub bind_addr: SocketAddr,
    pub log_dir: PathBuf,
    pub log_retention_days: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let testnet = match lookup("TESTNET") {
            Some(raw) => parse_flag("TESTNET", &raw)?,
            None => true,
        };

        let mut exchange =
            BybitConfig::for_network(testnet, required("API_KEY")?, required("API_SECRET")?);
        if let Some(url) = lookup("BYBIT_BASE_URL").filter(|v| !v.is_empty()) {
            exchange.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("RECV_WINDOW_MS") {
            exchange.recv_window_ms = parse_value("RECV_WINDOW_MS", &raw)?;
        }

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            exchange,
            testnet,
            webhook_secret: required("WEBHOOK_SECRET")?,
            bind_addr: parse_value("BIND_ADDR", &bind_addr)?,
            log_dir: lookup("LOG_DIR")
                .unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())
                .into(),
            log_retention_days: match lookup("LOG_RETENTION_DAYS") {
                Some(raw) => parse_value("LOG_RETENTION_DAYS", &raw)?,
                None => DEFAULT_LOG_RETENTION_DAYS,
            },
        })
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
        }),
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}
