//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use gateway_providers::{Credentials, ProviderCredentials};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Base of the redirect sent to users after a provider callback
    pub app_host: String,
    pub auth_token: String,
    pub credentials: ProviderCredentials,
    pub provider_timeout: Duration,
    pub log_format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`; unset and empty values are the same.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let port = get("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("PORT is not a valid port: {}", e))?;

        let database_url = match get("DATABASE_URL") {
            Some(url) => url,
            None => {
                let host = require("DB_HOST").map_err(|_| {
                    anyhow::anyhow!("DATABASE_URL or DB_HOST environment variable is required")
                })?;
                format!(
                    "postgres://{}:{}@{}:{}/{}?sslmode={}",
                    require("DB_USER")?,
                    get("DB_PASSWORD").unwrap_or_default(),
                    host,
                    get("DB_PORT").unwrap_or_else(|| "5432".to_string()),
                    require("DB_NAME")?,
                    get("DB_SSLMODE").unwrap_or_else(|| "disable".to_string()),
                )
            }
        };

        let provider_timeout = match get("PROVIDER_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(secs.parse().map_err(|e| {
                anyhow::anyhow!("PROVIDER_TIMEOUT_SECS is not a whole number of seconds: {}", e)
            })?),
            None => Duration::from_secs(30),
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let credentials = ProviderCredentials {
            hsbc: Credentials::new(
                get("HSBC_USER_ID").unwrap_or_default(),
                get("HSBC_USER_SECRET").unwrap_or_default(),
            ),
            adcb: Credentials::new(
                get("ADCB_USER_ID").unwrap_or_default(),
                get("ADCB_USER_SECRET").unwrap_or_default(),
            ),
        };

        Ok(Self {
            port,
            database_url,
            app_host: require("APP_HOST")?,
            auth_token: require("AUTH_TOKEN")?,
            credentials,
            provider_timeout,
            log_format,
            otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }
}
