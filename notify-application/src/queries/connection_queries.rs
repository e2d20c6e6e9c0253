use notify_domain::{Connection, ConnectionId, ConnectionState, UserId};

use crate::ops::SessionCounts;
use crate::{AppError, AppState};

pub async fn list_user_connections(
    state: &AppState,
    user_id: &UserId,
) -> Result<Vec<Connection>, AppError> {
    let Some(repo) = state.clients.try_connection_repo().await? else {
        return Ok(Vec::new());
    };
    let mut connections = repo.list_by_user(user_id).await?;
    connections.sort_by_key(|connection| connection.connected_at);
    Ok(connections)
}

/// Lifecycle state as seen by this instance only.
pub async fn connection_state(
    state: &AppState,
    connection_id: &ConnectionId,
) -> Option<ConnectionState> {
    state.sessions.state(connection_id).await
}

pub async fn session_counts(state: &AppState) -> SessionCounts {
    state.sessions.counts().await
}
