use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use notify_application::{AppState, ClientHandles, LocalSessionHub};
use notify_infrastructure::{AppConfig, ConfiguredClientFactory};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        Self::from_config(&config).await
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let local_hub = Arc::new(LocalSessionHub::default());
        let factory = ConfiguredClientFactory::new(
            config.to_db_config()?,
            config.to_delivery_config(),
            local_hub.clone(),
        );
        let state = AppState::new(
            runtime_config,
            ClientHandles::new(Arc::new(factory)),
            local_hub,
        );

        if state.config.broadcasting_enabled() {
            // Warm both handles; a failure here is retried on first use.
            let _ = state.clients.connection_repo().await;
            let _ = state.clients.delivery_client().await;
        } else {
            info!("broadcasting disabled: connections_table and delivery_endpoint are both required");
        }

        Ok(Self { state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_context_is_ready_to_broadcast() {
        let config = AppConfig {
            store_backend: "memory".to_string(),
            connections_table: Some("ws_connections".to_string()),
            delivery_endpoint: Some("local".to_string()),
            ..AppConfig::default()
        };
        let context = AppContext::from_config(&config).await.expect("context");
        assert!(context.state.config.broadcasting_enabled());
        let delivery = context
            .state
            .clients
            .delivery_client()
            .await
            .expect("delivery configured");
        assert_eq!(delivery.mode(), "local");
        assert!(context.state.clients.connection_repo().await.is_some());
    }
}
