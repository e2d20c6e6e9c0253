// Connection entity
// One live transport session owned by one user

use clickhouse::Row;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::utils::{millis_to_utc, utc_to_millis};
use crate::value_objects::{ConnectionId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub connection_id: String,
    pub user_id: String,
    /// Epoch milliseconds.
    pub connected_at: i64,
    /// Expiry in epoch seconds, pushed forward while the connection is live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

impl Connection {
    pub fn new(
        user_id: &UserId,
        connection_id: &ConnectionId,
        connected_at: i64,
        ttl_seconds: u64,
    ) -> Self {
        Self::expiring(user_id, connection_id, connected_at, connected_at, ttl_seconds)
    }

    /// Record whose ttl counts from `refreshed_at` (epoch millis) rather than
    /// from the join.
    pub fn expiring(
        user_id: &UserId,
        connection_id: &ConnectionId,
        connected_at: i64,
        refreshed_at: i64,
        ttl_seconds: u64,
    ) -> Self {
        let ttl = if ttl_seconds == 0 {
            None
        } else {
            Some(refreshed_at / 1000 + ttl_seconds as i64)
        };
        Self {
            connection_id: connection_id.0.clone(),
            user_id: user_id.0.clone(),
            connected_at,
            ttl,
        }
    }

    pub fn id(&self) -> ConnectionId {
        ConnectionId(self.connection_id.clone())
    }

    pub fn owner(&self) -> UserId {
        UserId(self.user_id.clone())
    }

    pub fn is_expired(&self, now_seconds: i64) -> bool {
        self.ttl.map(|ttl| ttl <= now_seconds).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct ConnectionRow {
    pub user_id: String,
    pub connection_id: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub connected_at: OffsetDateTime,
    pub ttl: Option<i64>,
}

impl From<&Connection> for ConnectionRow {
    fn from(connection: &Connection) -> Self {
        Self {
            user_id: connection.user_id.clone(),
            connection_id: connection.connection_id.clone(),
            connected_at: millis_to_utc(connection.connected_at),
            ttl: connection.ttl,
        }
    }
}

impl From<ConnectionRow> for Connection {
    fn from(row: ConnectionRow) -> Self {
        Self {
            connection_id: row.connection_id,
            user_id: row.user_id,
            connected_at: utc_to_millis(row.connected_at),
            ttl: row.ttl,
        }
    }
}
