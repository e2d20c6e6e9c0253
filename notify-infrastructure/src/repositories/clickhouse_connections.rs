use anyhow::Result;
use async_trait::async_trait;
use clickhouse::Client;

use notify_domain::{Connection, ConnectionId, ConnectionRepository, ConnectionRow, UserId};

#[derive(Clone)]
pub struct ClickhouseConnectionRepository {
    client: Client,
    database: String,
    table: String,
}

impl ClickhouseConnectionRepository {
    pub fn new(client: Client, database: String, table: String) -> Self {
        Self {
            client,
            database,
            table,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl ConnectionRepository for ClickhouseConnectionRepository {
    async fn ensure_schema(&self) -> Result<()> {
        let create_db = format!("CREATE DATABASE IF NOT EXISTS {}", self.database);
        self.client.query(&create_db).execute().await?;

        // One row per (user, connection); re-puts collapse on merge and FINAL reads.
        let create_connections = format!(
            r#"
CREATE TABLE IF NOT EXISTS {} (
    user_id String,
    connection_id String,
    connected_at DateTime64(3),
    ttl Nullable(Int64)
) ENGINE = ReplacingMergeTree(connected_at)
ORDER BY (user_id, connection_id)
"#,
            self.table
        );
        self.client.query(&create_connections).execute().await?;
        Ok(())
    }

    async fn put(&self, connection: &Connection) -> Result<()> {
        let evict = format!(
            "DELETE FROM {} WHERE connection_id = ? AND user_id != ?",
            self.table
        );
        self.client
            .query(&evict)
            .bind(connection.connection_id.as_str())
            .bind(connection.user_id.as_str())
            .execute()
            .await?;

        let mut insert = self.client.insert(&self.table)?;
        insert.write(&ConnectionRow::from(connection)).await?;
        insert.end().await?;
        Ok(())
    }

    async fn remove(&self, user_id: &UserId, connection_id: &ConnectionId) -> Result<()> {
        let query = format!(
            "DELETE FROM {} WHERE user_id = ? AND connection_id = ?",
            self.table
        );
        self.client
            .query(&query)
            .bind(user_id.as_str())
            .bind(connection_id.as_str())
            .execute()
            .await?;
        Ok(())
    }

    async fn remove_connection(&self, connection_id: &ConnectionId) -> Result<()> {
        let query = format!("DELETE FROM {} WHERE connection_id = ?", self.table);
        self.client
            .query(&query)
            .bind(connection_id.as_str())
            .execute()
            .await?;
        Ok(())
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Connection>> {
        let query = format!(
            "SELECT user_id, connection_id, connected_at, ttl FROM {} FINAL WHERE user_id = ?",
            self.table
        );
        let rows = self
            .client
            .query(&query)
            .bind(user_id.as_str())
            .fetch_all::<ConnectionRow>()
            .await?;
        Ok(rows.into_iter().map(Connection::from).collect())
    }

    async fn purge_expired(&self, now_seconds: i64) -> Result<u64> {
        let count_query = format!(
            "SELECT count() FROM {} FINAL WHERE ttl IS NOT NULL AND ttl <= ?",
            self.table
        );
        let expired: u64 = self
            .client
            .query(&count_query)
            .bind(now_seconds)
            .fetch_one()
            .await?;
        if expired == 0 {
            return Ok(0);
        }

        let delete = format!(
            "DELETE FROM {} WHERE ttl IS NOT NULL AND ttl <= ?",
            self.table
        );
        self.client
            .query(&delete)
            .bind(now_seconds)
            .execute()
            .await?;
        Ok(expired)
    }

    async fn ping(&self) -> Result<()> {
        let _: u8 = self.client.query("SELECT toUInt8(1)").fetch_one().await?;
        Ok(())
    }
}
