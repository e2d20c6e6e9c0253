use std::sync::Arc;

use async_trait::async_trait;

use crate::ports::ConnectionRepository;
use crate::value_objects::{ConnectionId, DeliveryOutcome};

#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// One attempt, no retry. Timeouts surface as `TransientError`.
    async fn send(&self, connection_id: &ConnectionId, payload: &str) -> DeliveryOutcome;
    fn mode(&self) -> &'static str;
}

/// Builds the process-wide store and delivery handles. `Ok(None)` means the
/// capability is not configured.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn connection_repo(&self) -> anyhow::Result<Option<Arc<dyn ConnectionRepository>>>;
    async fn delivery_client(&self) -> anyhow::Result<Option<Arc<dyn DeliveryClient>>>;
}
