use dotenv::dotenv;
use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 64;

/// Where notifications are delivered when a webhook is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
    pub url: String,
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub data_dir: PathBuf,
    pub availability_path: PathBuf,
    pub legacy_availability_path: Option<PathBuf>,
    pub webhook: Option<WebhookConfig>,
    pub request_timeout: Duration,
    pub concurrency_limit: usize,
}

impl Config {
    /// Read the configuration from the process environment, after loading
    /// `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_vars(&env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            vars.get(name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };

        let bind_address = parse_var(
            "BIND_ADDRESS",
            var("BIND_ADDRESS").unwrap_or(DEFAULT_BIND_ADDRESS),
        )?;

        let data_dir = PathBuf::from(var("DATA_DIR").unwrap_or(DEFAULT_DATA_DIR));
        let availability_path = var("AVAILABILITY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("availability.json"));
        let legacy_availability_path = var("LEGACY_AVAILABILITY_PATH").map(PathBuf::from);

        let webhook = match (var("NOTIFIER_WEBHOOK_URL"), var("NOTIFIER_WEBHOOK_SECRET")) {
            (Some(url), Some(secret)) => Some(WebhookConfig {
                url: url.to_string(),
                secret: secret.to_string(),
            }),
            (Some(_), None) => return Err(ConfigError::Missing("NOTIFIER_WEBHOOK_SECRET")),
            (None, _) => None,
        };

        let request_timeout = match var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", raw)?),
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let concurrency_limit = match var("CONCURRENCY_LIMIT") {
            Some(raw) => parse_var("CONCURRENCY_LIMIT", raw)?,
            None => DEFAULT_CONCURRENCY_LIMIT,
        };
        if concurrency_limit == 0 {
            return Err(ConfigError::Invalid {
                name: "CONCURRENCY_LIMIT",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bind_address,
            data_dir,
            availability_path,
            legacy_availability_path,
            webhook,
            request_timeout,
            concurrency_limit,
        })
    }

    pub fn log_summary(&self) {
        info!("Data directory: {}", self.data_dir.display());
        info!("Availability file: {}", self.availability_path.display());
        match &self.legacy_availability_path {
            Some(path) => info!("Legacy availability file: {}", path.display()),
            None => info!("No legacy availability file configured"),
        }
        match &self.webhook {
            Some(webhook) => info!("Notifications delivered to webhook {}", webhook.url),
            None => info!("No notifier webhook configured - notifications are only logged"),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}
