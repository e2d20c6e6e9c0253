use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use notify_application::commands::lifecycle_commands;
use notify_application::AppState;
use notify_domain::{ConnectionId, ServerMessage};

use crate::error::HttpError;
use crate::middleware::authorize;

/// Lifecycle events forwarded by a fronting gateway that owns the sockets.
pub async fn gateway_connect(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(connection_id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let connection_id = authorized_connection(&state, &headers, &connection_id)?;
    lifecycle_commands::on_connect(&state, &connection_id).await;
    Ok(StatusCode::OK)
}

pub async fn gateway_disconnect(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(connection_id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let connection_id = authorized_connection(&state, &headers, &connection_id)?;
    lifecycle_commands::on_disconnect(&state, &connection_id).await;
    Ok(StatusCode::OK)
}

pub async fn gateway_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(connection_id): Path<String>,
    body: String,
) -> Result<Json<ServerMessage>, HttpError> {
    let connection_id = authorized_connection(&state, &headers, &connection_id)?;
    let reply = lifecycle_commands::on_message(&state, &connection_id, &body).await?;
    Ok(Json(reply))
}

fn authorized_connection(
    state: &AppState,
    headers: &HeaderMap,
    raw: &str,
) -> Result<ConnectionId, HttpError> {
    if !authorize(&state.config, headers) {
        return Err(HttpError::Unauthorized);
    }
    ConnectionId::parse(raw).ok_or_else(|| HttpError::BadRequest {
        code: "BAD_REQUEST",
        message: "connection id must not be blank".to_string(),
    })
}
