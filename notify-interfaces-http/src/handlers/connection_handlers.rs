use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use notify_application::queries::connection_queries;
use notify_application::AppState;
use notify_domain::{Connection, ConnectionId, ConnectionState, UserId};

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStateView {
    pub connection_id: ConnectionId,
    #[serde(flatten)]
    pub state: ConnectionState,
}

pub async fn list_user_connections(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Connection>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let user_id = UserId::parse(&user_id).ok_or(HttpError::NotFound)?;
    let connections = connection_queries::list_user_connections(&state, &user_id).await?;
    Ok(Json(connections))
}

pub async fn get_connection_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(connection_id): Path<String>,
) -> Result<Json<ConnectionStateView>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let connection_id = ConnectionId::parse(&connection_id).ok_or(HttpError::NotFound)?;
    let current = connection_queries::connection_state(&state, &connection_id)
        .await
        .ok_or(HttpError::NotFound)?;
    Ok(Json(ConnectionStateView {
        connection_id,
        state: current,
    }))
}
