use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use notify_application::AppError;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Internal(String),
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        let code = value.code();
        match value {
            AppError::Unauthorized => HttpError::Unauthorized,
            AppError::BadRequest(message) => HttpError::BadRequest { code, message },
            AppError::InvalidMessage(err) => HttpError::BadRequest {
                code,
                message: err.to_string(),
            },
            AppError::Internal(err) => HttpError::Internal(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, error, code) = match self {
            HttpError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string(), None),
            HttpError::BadRequest { code, message } => (
                StatusCode::BAD_REQUEST,
                format!("bad request: {}", message),
                Some(code),
            ),
            HttpError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string(), None),
            HttpError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message, None),
        };
        (status, Json(ErrorBody { error, code })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use notify_domain::MessageError;

    use super::*;

    #[test]
    fn invalid_message_maps_to_bad_request_with_code() {
        let err = HttpError::from(AppError::from(MessageError::MissingUserId));
        match err {
            HttpError::BadRequest { code, .. } => assert_eq!(code, "MISSING_USER_ID"),
            other => panic!("unexpected {:?}", other),
        }
        let response = HttpError::from(AppError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
