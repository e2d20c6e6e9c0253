use async_trait::async_trait;

use crate::entities::Connection;
use crate::value_objects::{ConnectionId, UserId};

/// Durable registry of live connections, keyed by (user, connection) with
/// lookups by user on the hot path.
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    /// Upsert. A connection id re-put under a different user leaves no
    /// record behind for the previous user.
    async fn put(&self, connection: &Connection) -> anyhow::Result<()>;
    async fn remove(&self, user_id: &UserId, connection_id: &ConnectionId) -> anyhow::Result<()>;
    /// Removal when the owning user is not known to the caller.
    async fn remove_connection(&self, connection_id: &ConnectionId) -> anyhow::Result<()>;
    async fn list_by_user(&self, user_id: &UserId) -> anyhow::Result<Vec<Connection>>;
    /// Deletes records whose ttl is at or before `now_seconds`; returns how many went.
    async fn purge_expired(&self, now_seconds: i64) -> anyhow::Result<u64>;
    async fn ping(&self) -> anyhow::Result<()>;
}
