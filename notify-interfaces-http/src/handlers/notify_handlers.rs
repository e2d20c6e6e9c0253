use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use notify_application::commands::notify_commands;
use notify_application::AppState;
use notify_domain::{BroadcastReport, NotifyBatchRequest, NotifyRequest};

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn notify_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NotifyRequest>,
) -> Result<(StatusCode, Json<BroadcastReport>), HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let report = notify_commands::notify(&state, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(report)))
}

pub async fn notify_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NotifyBatchRequest>,
) -> Result<(StatusCode, Json<Vec<BroadcastReport>>), HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let reports = notify_commands::notify_batch(&state, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(reports)))
}
