// Notification requests and broadcast reports

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    pub user_id: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyBatchRequest {
    pub user_ids: Vec<String>,
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastStatus {
    /// Delivery endpoint or connection table not configured.
    Disabled,
    StoreUnavailable,
    NoConnections,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReport {
    pub user_id: String,
    pub status: BroadcastStatus,
    pub recipients: usize,
    pub delivered: usize,
    pub gone: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn empty(user_id: &str, status: BroadcastStatus) -> Self {
        Self {
            user_id: user_id.to_string(),
            status,
            recipients: 0,
            delivered: 0,
            gone: 0,
            failed: 0,
        }
    }
}
