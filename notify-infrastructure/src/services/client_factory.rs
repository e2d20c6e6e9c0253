use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clickhouse::Client;
use tracing::info;

use notify_application::LocalSessionHub;
use notify_domain::{
    ClientFactory, ConnectionRepository, DbConfig, DeliveryClient, DeliveryConfig, DeliveryTarget,
    StoreBackend,
};

use crate::repositories::{ClickhouseConnectionRepository, InMemoryConnectionRepository};
use crate::services::{GatewayDeliveryClient, LocalDeliveryClient};

/// Builds clients from loaded configuration. Unset table or endpoint means
/// the matching capability is off.
pub struct ConfiguredClientFactory {
    db: DbConfig,
    delivery: DeliveryConfig,
    local_hub: Arc<LocalSessionHub>,
}

impl ConfiguredClientFactory {
    pub fn new(db: DbConfig, delivery: DeliveryConfig, local_hub: Arc<LocalSessionHub>) -> Self {
        Self {
            db,
            delivery,
            local_hub,
        }
    }

    fn clickhouse_client(&self) -> Client {
        let mut client = Client::default()
            .with_url(&self.db.clickhouse_url)
            .with_database(&self.db.clickhouse_database);
        if let Some(user) = &self.db.clickhouse_user {
            client = client.with_user(user);
        }
        if let Some(password) = &self.db.clickhouse_password {
            client = client.with_password(password);
        }
        client
    }
}

#[async_trait]
impl ClientFactory for ConfiguredClientFactory {
    async fn connection_repo(&self) -> Result<Option<Arc<dyn ConnectionRepository>>> {
        let Some(table) = &self.db.connections_table else {
            return Ok(None);
        };
        let repo: Arc<dyn ConnectionRepository> = match self.db.store_backend {
            StoreBackend::Clickhouse => Arc::new(ClickhouseConnectionRepository::new(
                self.clickhouse_client(),
                self.db.clickhouse_database.clone(),
                table.clone(),
            )),
            StoreBackend::Memory => Arc::new(InMemoryConnectionRepository::new()),
        };
        repo.ensure_schema().await?;
        info!(
            "connection store ready: backend={:?} table={}",
            self.db.store_backend, table
        );
        Ok(Some(repo))
    }

    async fn delivery_client(&self) -> Result<Option<Arc<dyn DeliveryClient>>> {
        let Some(endpoint) = &self.delivery.delivery_endpoint else {
            return Ok(None);
        };
        let client: Arc<dyn DeliveryClient> = match DeliveryTarget::parse(endpoint)? {
            DeliveryTarget::Local => Arc::new(LocalDeliveryClient::new(self.local_hub.clone())),
            DeliveryTarget::Gateway(url) => Arc::new(GatewayDeliveryClient::new(
                &url,
                self.delivery.delivery_token.clone(),
                self.delivery.delivery_timeout_seconds,
            )?),
        };
        info!("delivery client ready: mode={}", client.mode());
        Ok(Some(client))
    }
}
