//! Process-wide store and delivery handles.
//!
//! Both are built on first use through a [`ClientFactory`] and then shared for
//! the lifetime of the owning [`crate::AppState`]. A failed build is not
//! cached, so the next caller retries.

use std::sync::Arc;

use async_trait::async_trait;
use notify_domain::{ClientFactory, ConnectionRepository, DeliveryClient};
use tokio::sync::OnceCell;
use tracing::warn;

pub struct ClientHandles {
    factory: Arc<dyn ClientFactory>,
    connection_repo: OnceCell<Option<Arc<dyn ConnectionRepository>>>,
    delivery_client: OnceCell<Option<Arc<dyn DeliveryClient>>>,
}

impl ClientHandles {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            factory,
            connection_repo: OnceCell::new(),
            delivery_client: OnceCell::new(),
        }
    }

    /// Handles backed by already-built clients.
    pub fn with_clients(
        connection_repo: Option<Arc<dyn ConnectionRepository>>,
        delivery_client: Option<Arc<dyn DeliveryClient>>,
    ) -> Self {
        Self::new(Arc::new(StaticClients {
            connection_repo,
            delivery_client,
        }))
    }

    pub async fn try_connection_repo(
        &self,
    ) -> anyhow::Result<Option<Arc<dyn ConnectionRepository>>> {
        self.connection_repo
            .get_or_try_init(|| self.factory.connection_repo())
            .await
            .cloned()
    }

    pub async fn try_delivery_client(&self) -> anyhow::Result<Option<Arc<dyn DeliveryClient>>> {
        self.delivery_client
            .get_or_try_init(|| self.factory.delivery_client())
            .await
            .cloned()
    }

    pub async fn connection_repo(&self) -> Option<Arc<dyn ConnectionRepository>> {
        match self.try_connection_repo().await {
            Ok(repo) => repo,
            Err(err) => {
                warn!("connection store unavailable: {}", err);
                None
            }
        }
    }

    pub async fn delivery_client(&self) -> Option<Arc<dyn DeliveryClient>> {
        match self.try_delivery_client().await {
            Ok(client) => client,
            Err(err) => {
                warn!("delivery client unavailable: {}", err);
                None
            }
        }
    }
}

pub struct StaticClients {
    pub connection_repo: Option<Arc<dyn ConnectionRepository>>,
    pub delivery_client: Option<Arc<dyn DeliveryClient>>,
}

#[async_trait]
impl ClientFactory for StaticClients {
    async fn connection_repo(&self) -> anyhow::Result<Option<Arc<dyn ConnectionRepository>>> {
        Ok(self.connection_repo.clone())
    }

    async fn delivery_client(&self) -> anyhow::Result<Option<Arc<dyn DeliveryClient>>> {
        Ok(self.delivery_client.clone())
    }
}
