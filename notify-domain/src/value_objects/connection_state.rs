// Connection lifecycle state

use serde::Serialize;

use crate::value_objects::UserId;

/// `Pending` -> `Active` -> `Closed`. `Closed` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ConnectionState {
    Pending,
    Active {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Pending => "pending",
            ConnectionState::Active { .. } => "active",
            ConnectionState::Closed => "closed",
        }
    }

    pub fn accepts_join(&self) -> bool {
        !matches!(self, ConnectionState::Closed)
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            ConnectionState::Active { user_id } => Some(user_id),
            _ => None,
        }
    }
}
