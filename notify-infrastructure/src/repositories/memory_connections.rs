use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use notify_domain::{Connection, ConnectionId, ConnectionRepository, UserId};

#[derive(Default)]
struct Tables {
    by_connection: HashMap<ConnectionId, Connection>,
    by_user: HashMap<UserId, HashSet<ConnectionId>>,
}

impl Tables {
    fn detach(&mut self, connection_id: &ConnectionId) -> Option<Connection> {
        let connection = self.by_connection.remove(connection_id)?;
        let owner = connection.owner();
        if let Some(ids) = self.by_user.get_mut(&owner) {
            ids.remove(connection_id);
            if ids.is_empty() {
                self.by_user.remove(&owner);
            }
        }
        Some(connection)
    }
}

/// Process-local store with a per-user index. Not durable; for single
/// instance deployments and development.
#[derive(Default)]
pub struct InMemoryConnectionRepository {
    tables: RwLock<Tables>,
}

impl InMemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.by_connection.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn put(&self, connection: &Connection) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        let id = connection.id();
        tables.detach(&id);
        tables
            .by_user
            .entry(connection.owner())
            .or_default()
            .insert(id.clone());
        tables.by_connection.insert(id, connection.clone());
        Ok(())
    }

    async fn remove(&self, user_id: &UserId, connection_id: &ConnectionId) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .by_connection
            .get(connection_id)
            .map(|connection| connection.user_id == user_id.0)
            .unwrap_or(false);
        if owned {
            tables.detach(connection_id);
        }
        Ok(())
    }

    async fn remove_connection(&self, connection_id: &ConnectionId) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        tables.detach(connection_id);
        Ok(())
    }

    async fn list_by_user(&self, user_id: &UserId) -> anyhow::Result<Vec<Connection>> {
        let tables = self.tables.read().await;
        let Some(ids) = tables.by_user.get(user_id) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| tables.by_connection.get(id).cloned())
            .collect())
    }

    async fn purge_expired(&self, now_seconds: i64) -> anyhow::Result<u64> {
        let mut tables = self.tables.write().await;
        let expired = tables
            .by_connection
            .values()
            .filter(|connection| connection.is_expired(now_seconds))
            .map(Connection::id)
            .collect::<Vec<_>>();
        for id in &expired {
            tables.detach(id);
        }
        Ok(expired.len() as u64)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
