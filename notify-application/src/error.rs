use notify_domain::MessageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] MessageError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable code for error frames sent back over a connection.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::InvalidMessage(err) => err.code(),
            AppError::Internal(_) => "INTERNAL",
        }
    }
}
