use std::collections::{HashMap, HashSet};

use notify_domain::ConnectionId;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;

const OUTBOUND_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalPush {
    Queued,
    /// No session with that id on this instance.
    Missing,
    /// The session's writer has shut down.
    Closed,
    Full,
}

/// Outbound queues of the WebSocket sessions terminated by this process.
#[derive(Default)]
pub struct LocalSessionHub {
    outbound: RwLock<HashMap<ConnectionId, mpsc::Sender<String>>>,
}

impl LocalSessionHub {
    /// Registers a session. The sender is for the session's own replies, the
    /// receiver feeds its socket writer.
    pub async fn register(
        &self,
        connection_id: &ConnectionId,
    ) -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let mut outbound = self.outbound.write().await;
        outbound.insert(connection_id.clone(), tx.clone());
        (tx, rx)
    }

    pub async fn unregister(&self, connection_id: &ConnectionId) {
        let mut outbound = self.outbound.write().await;
        outbound.remove(connection_id);
    }

    pub async fn push(&self, connection_id: &ConnectionId, payload: &str) -> LocalPush {
        let sender = {
            let outbound = self.outbound.read().await;
            outbound.get(connection_id).cloned()
        };
        let Some(sender) = sender else {
            return LocalPush::Missing;
        };
        match sender.try_send(payload.to_string()) {
            Ok(()) => LocalPush::Queued,
            Err(TrySendError::Full(_)) => LocalPush::Full,
            Err(TrySendError::Closed(_)) => LocalPush::Closed,
        }
    }

    pub async fn connection_ids(&self) -> HashSet<ConnectionId> {
        self.outbound.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.outbound.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
