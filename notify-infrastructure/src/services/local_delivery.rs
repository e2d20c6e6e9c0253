use std::sync::Arc;

use async_trait::async_trait;

use notify_application::{LocalPush, LocalSessionHub};
use notify_domain::{ConnectionId, DeliveryClient, DeliveryOutcome};

/// Delivers to sockets terminated by this process. A connection held by
/// another instance looks the same as a dead one here, so this mode suits
/// single-instance deployments only.
pub struct LocalDeliveryClient {
    hub: Arc<LocalSessionHub>,
}

impl LocalDeliveryClient {
    pub fn new(hub: Arc<LocalSessionHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl DeliveryClient for LocalDeliveryClient {
    async fn send(&self, connection_id: &ConnectionId, payload: &str) -> DeliveryOutcome {
        match self.hub.push(connection_id, payload).await {
            LocalPush::Queued => DeliveryOutcome::Delivered,
            LocalPush::Missing | LocalPush::Closed => DeliveryOutcome::Gone,
            LocalPush::Full => DeliveryOutcome::TransientError("outbound buffer full".to_string()),
        }
    }

    fn mode(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn maps_hub_results_to_outcomes() {
        let hub = Arc::new(LocalSessionHub::default());
        let client = LocalDeliveryClient::new(hub.clone());
        let live = ConnectionId("live".to_string());
        let (_tx, mut rx) = hub.register(&live).await;

        assert_eq!(client.send(&live, "hi").await, DeliveryOutcome::Delivered);
        assert_eq!(rx.recv().await.as_deref(), Some("hi"));

        assert_eq!(
            client.send(&ConnectionId("nobody".to_string()), "hi").await,
            DeliveryOutcome::Gone
        );

        let closed = ConnectionId("closed".to_string());
        let (tx, rx) = hub.register(&closed).await;
        drop(tx);
        drop(rx);
        assert_eq!(client.send(&closed, "hi").await, DeliveryOutcome::Gone);
    }

    #[tokio::test]
    async fn full_buffer_is_transient() {
        let hub = Arc::new(LocalSessionHub::default());
        let client = LocalDeliveryClient::new(hub.clone());
        let id = ConnectionId("slow".to_string());
        let (_tx, _rx) = hub.register(&id).await;

        let mut last = DeliveryOutcome::Delivered;
        for _ in 0..100 {
            last = client.send(&id, "x").await;
        }
        assert!(matches!(last, DeliveryOutcome::TransientError(_)));
    }
}
