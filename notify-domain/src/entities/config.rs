// Runtime configuration handed from infrastructure to the other layers

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub connections_table: Option<String>,
    pub delivery_endpoint: Option<String>,
    pub connection_ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
    pub closed_retention_seconds: u64,
    pub ws_max_message_bytes: u64,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl RuntimeConfig {
    /// Broadcasting needs both a place to look connections up and a way to reach them.
    pub fn broadcasting_enabled(&self) -> bool {
        self.connections_table.is_some() && self.delivery_endpoint.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Clickhouse,
    Memory,
}

impl StoreBackend {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "clickhouse" => Ok(StoreBackend::Clickhouse),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("unknown store_backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub store_backend: StoreBackend,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
    pub connections_table: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub delivery_endpoint: Option<String>,
    pub delivery_token: Option<String>,
    pub delivery_timeout_seconds: u64,
}
