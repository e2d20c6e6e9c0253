use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use notify_domain::{DbConfig, DeliveryConfig, RuntimeConfig, StoreBackend};

use crate::config::{validate_delivery_endpoint, validate_table_name};

pub const CONFIG_PATH_ENV: &str = "HR_NOTIFY_CONFIG";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
    pub store_backend: String,
    pub connections_table: Option<String>,
    pub delivery_endpoint: Option<String>,
    pub delivery_token: Option<String>,
    pub delivery_timeout_seconds: u64,
    pub connection_ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
    pub closed_retention_seconds: u64,
    pub ws_max_message_bytes: u64,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3300".to_string(),
            api_token: None,
            clickhouse_url: "http://127.0.0.1:8123".to_string(),
            clickhouse_database: "hr_notify".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            store_backend: "clickhouse".to_string(),
            connections_table: None,
            delivery_endpoint: None,
            delivery_token: None,
            delivery_timeout_seconds: 5,
            connection_ttl_seconds: 2 * 60 * 60,
            sweep_interval_seconds: 5 * 60,
            closed_retention_seconds: 10 * 60,
            ws_max_message_bytes: 64 * 1024,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            toml::from_str::<AppConfig>(&content)?
        } else {
            warn!("{} not found, using defaults", path);
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        normalize_optional(&mut self.api_token);
        normalize_optional(&mut self.clickhouse_user);
        normalize_optional(&mut self.clickhouse_password);
        normalize_optional(&mut self.connections_table);
        normalize_optional(&mut self.delivery_endpoint);
        normalize_optional(&mut self.delivery_token);
        self.store_backend = self.store_backend.trim().to_lowercase();
        self.clickhouse_url = self.clickhouse_url.trim().to_string();
        self.clickhouse_database = self.clickhouse_database.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        let backend = StoreBackend::parse(&self.store_backend)?;
        if let Some(table) = &self.connections_table {
            validate_table_name(table)?;
        }
        if backend == StoreBackend::Clickhouse && self.connections_table.is_some() {
            if self.clickhouse_url.is_empty() {
                return Err(anyhow!("clickhouse_url must not be empty"));
            }
            validate_table_name(&self.clickhouse_database)
                .map_err(|_| anyhow!("invalid clickhouse_database '{}'", self.clickhouse_database))?;
        }
        if let Some(endpoint) = &self.delivery_endpoint {
            validate_delivery_endpoint(endpoint)?;
            if backend == StoreBackend::Clickhouse && endpoint.eq_ignore_ascii_case("local") {
                warn!("local delivery with a shared clickhouse store only works for one instance");
            }
        }
        if self.delivery_timeout_seconds == 0 {
            return Err(anyhow!("delivery_timeout_seconds must be greater than 0"));
        }
        if self.max_body_bytes == 0 || self.ws_max_message_bytes == 0 {
            return Err(anyhow!("max_body_bytes and ws_max_message_bytes must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            connections_table: self.connections_table.clone(),
            delivery_endpoint: self.delivery_endpoint.clone(),
            connection_ttl_seconds: self.connection_ttl_seconds,
            sweep_interval_seconds: self.sweep_interval_seconds,
            closed_retention_seconds: self.closed_retention_seconds,
            ws_max_message_bytes: self.ws_max_message_bytes,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_db_config(&self) -> Result<DbConfig> {
        Ok(DbConfig {
            store_backend: StoreBackend::parse(&self.store_backend)?,
            clickhouse_url: self.clickhouse_url.clone(),
            clickhouse_database: self.clickhouse_database.clone(),
            clickhouse_user: self.clickhouse_user.clone(),
            clickhouse_password: self.clickhouse_password.clone(),
            connections_table: self.connections_table.clone(),
        })
    }

    pub fn to_delivery_config(&self) -> DeliveryConfig {
        DeliveryConfig {
            delivery_endpoint: self.delivery_endpoint.clone(),
            delivery_token: self.delivery_token.clone(),
            delivery_timeout_seconds: self.delivery_timeout_seconds,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("HR_NOTIFY_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("HR_NOTIFY_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("HR_NOTIFY_CLICKHOUSE_URL") {
            self.clickhouse_url = value;
        }
        if let Ok(value) = env::var("HR_NOTIFY_CLICKHOUSE_DATABASE") {
            self.clickhouse_database = value;
        }
        if let Ok(value) = env::var("HR_NOTIFY_CLICKHOUSE_USER") {
            self.clickhouse_user = Some(value);
        }
        if let Ok(value) = env::var("HR_NOTIFY_CLICKHOUSE_PASSWORD") {
            self.clickhouse_password = Some(value);
        }
        if let Ok(value) = env::var("HR_NOTIFY_STORE_BACKEND") {
            self.store_backend = value;
        }
        if let Ok(value) = env::var("HR_NOTIFY_CONNECTIONS_TABLE") {
            self.connections_table = Some(value);
        }
        if let Ok(value) = env::var("HR_NOTIFY_DELIVERY_ENDPOINT") {
            self.delivery_endpoint = Some(value);
        }
        if let Ok(value) = env::var("HR_NOTIFY_DELIVERY_TOKEN") {
            self.delivery_token = Some(value);
        }
        if let Ok(value) = env::var("HR_NOTIFY_DELIVERY_TIMEOUT_SECONDS") {
            self.delivery_timeout_seconds = value.parse().unwrap_or(self.delivery_timeout_seconds);
        }
        if let Ok(value) = env::var("HR_NOTIFY_CONNECTION_TTL_SECONDS") {
            self.connection_ttl_seconds = value.parse().unwrap_or(self.connection_ttl_seconds);
        }
        if let Ok(value) = env::var("HR_NOTIFY_SWEEP_INTERVAL_SECONDS") {
            self.sweep_interval_seconds = value.parse().unwrap_or(self.sweep_interval_seconds);
        }
        if let Ok(value) = env::var("HR_NOTIFY_CLOSED_RETENTION_SECONDS") {
            self.closed_retention_seconds = value.parse().unwrap_or(self.closed_retention_seconds);
        }
        if let Ok(value) = env::var("HR_NOTIFY_WS_MAX_MESSAGE_BYTES") {
            self.ws_max_message_bytes = value.parse().unwrap_or(self.ws_max_message_bytes);
        }
        if let Ok(value) = env::var("HR_NOTIFY_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("HR_NOTIFY_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
    }
}

fn normalize_optional(value: &mut Option<String>) {
    *value = value
        .take()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
}
