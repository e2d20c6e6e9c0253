use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};

use notify_domain::{ConnectionId, DeliveryClient, DeliveryOutcome};

/// Posts payloads to the fronting gateway's per-connection management
/// resource, `POST {endpoint}/@connections/{connectionId}`.
pub struct GatewayDeliveryClient {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl GatewayDeliveryClient {
    pub fn new(endpoint: &str, token: Option<String>, timeout_seconds: u64) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|err| anyhow!("invalid delivery endpoint '{}': {}", endpoint, err))?;
        if endpoint.cannot_be_a_base() {
            return Err(anyhow!("delivery endpoint '{}' cannot carry a path", endpoint));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(1)))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    pub fn connection_url(&self, connection_id: &ConnectionId) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("delivery endpoint cannot carry a path"))?
            .pop_if_empty()
            .push("@connections")
            .push(connection_id.as_str());
        Ok(url)
    }
}

pub fn map_status(status: StatusCode) -> DeliveryOutcome {
    if status.is_success() {
        DeliveryOutcome::Delivered
    } else if status == StatusCode::GONE {
        DeliveryOutcome::Gone
    } else {
        DeliveryOutcome::TransientError(format!("gateway responded {}", status))
    }
}

#[async_trait]
impl DeliveryClient for GatewayDeliveryClient {
    async fn send(&self, connection_id: &ConnectionId, payload: &str) -> DeliveryOutcome {
        let url = match self.connection_url(connection_id) {
            Ok(url) => url,
            Err(err) => return DeliveryOutcome::TransientError(err.to_string()),
        };
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_string());
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        match request.send().await {
            Ok(response) => map_status(response.status()),
            Err(err) if err.is_timeout() => {
                DeliveryOutcome::TransientError("gateway request timed out".to_string())
            }
            Err(err) => DeliveryOutcome::TransientError(err.to_string()),
        }
    }

    fn mode(&self) -> &'static str {
        "gateway"
    }
}
