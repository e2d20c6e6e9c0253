// Client <-> server frames on a notification connection

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::value_objects::{ConnectionId, UserId};

/// Inbound frame, decoded from `{"action": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Join { user_id: UserId },
    Ping,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("message body is not a json object")]
    Malformed,
    #[error("message is missing 'action'")]
    MissingAction,
    #[error("unsupported action '{0}'")]
    UnsupportedAction(String),
    #[error("join requires a non-empty 'userId'")]
    MissingUserId,
}

impl MessageError {
    pub fn code(&self) -> &'static str {
        match self {
            MessageError::Malformed => "MALFORMED_MESSAGE",
            MessageError::MissingAction => "MISSING_ACTION",
            MessageError::UnsupportedAction(_) => "UNSUPPORTED_ACTION",
            MessageError::MissingUserId => "MISSING_USER_ID",
        }
    }
}

impl ClientMessage {
    pub fn parse(raw: &str) -> Result<Self, MessageError> {
        let value: Value = serde_json::from_str(raw).map_err(|_| MessageError::Malformed)?;
        let Some(object) = value.as_object() else {
            return Err(MessageError::Malformed);
        };
        let action = object
            .get("action")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|action| !action.is_empty())
            .ok_or(MessageError::MissingAction)?;

        match action.to_ascii_lowercase().as_str() {
            "join" => {
                let user_id = object
                    .get("userId")
                    .or_else(|| object.get("user_id"))
                    .and_then(parse_user_id)
                    .ok_or(MessageError::MissingUserId)?;
                Ok(ClientMessage::Join { user_id })
            }
            "ping" => Ok(ClientMessage::Ping),
            _ => Err(MessageError::UnsupportedAction(action.to_string())),
        }
    }
}

// Employee ids arrive either as strings or as numbers.
fn parse_user_id(value: &Value) -> Option<UserId> {
    match value {
        Value::String(text) => UserId::parse(text),
        Value::Number(number) => UserId::parse(&number.to_string()),
        _ => None,
    }
}

/// Outbound control frame. Broadcast payloads are sent as-is, not wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Joined {
        #[serde(rename = "connectionId")]
        connection_id: ConnectionId,
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    Pong,
    Error {
        code: String,
        message: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error"}"#.to_string())
    }
}
