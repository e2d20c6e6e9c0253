// Delivery target value object

use anyhow::{anyhow, Result};

pub const LOCAL_DELIVERY_ENDPOINT: &str = "local";

/// Where delivery attempts go, parsed from the configured endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    /// WebSocket sessions held by this process.
    Local,
    /// Management endpoint of a fronting gateway, without trailing slash.
    Gateway(String),
}

impl DeliveryTarget {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(LOCAL_DELIVERY_ENDPOINT) {
            return Ok(DeliveryTarget::Local);
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(DeliveryTarget::Gateway(trimmed.trim_end_matches('/').to_string()));
        }
        Err(anyhow!(
            "delivery endpoint must be 'local' or an http(s) url, got '{}'",
            trimmed
        ))
    }

    pub fn mode(&self) -> &'static str {
        match self {
            DeliveryTarget::Local => "local",
            DeliveryTarget::Gateway(_) => "gateway",
        }
    }
}
