use tracing::{debug, info, warn};

use notify_domain::{
    current_millis, ClientMessage, Connection, ConnectionId, ConnectionState, ServerMessage,
    UserId,
};

use crate::ops::{JoinTransition, LiveRecord};
use crate::{AppError, AppState};

pub async fn on_connect(state: &AppState, connection_id: &ConnectionId) {
    state.sessions.open(connection_id).await;
    state.metrics.record_connect();
    debug!(connection_id = %connection_id, "connection opened");
}

/// Handles one inbound frame. Errors are meant for the client; the
/// connection's state is left untouched when one is returned.
pub async fn on_message(
    state: &AppState,
    connection_id: &ConnectionId,
    raw: &str,
) -> Result<ServerMessage, AppError> {
    let message = ClientMessage::parse(raw).map_err(|err| {
        state.metrics.record_rejected_message();
        warn!(connection_id = %connection_id, "rejected client message: {}", err);
        AppError::from(err)
    })?;

    match message {
        ClientMessage::Join { user_id } => on_join(state, connection_id, user_id).await,
        ClientMessage::Ping => {
            let refresh_before = refresh_cutoff(state).unwrap_or(i64::MIN);
            if let Some(record) = state.sessions.touch(connection_id, refresh_before).await {
                refresh_record(state, &record).await;
            }
            Ok(ServerMessage::Pong)
        }
    }
}

/// Records last refreshed before the returned epoch millis are due for a new
/// ttl. `None` when records never expire.
pub fn refresh_cutoff(state: &AppState) -> Option<i64> {
    let ttl_millis = (state.config.connection_ttl_seconds as i64).saturating_mul(1000);
    if ttl_millis == 0 {
        return None;
    }
    Some(current_millis().saturating_sub(ttl_millis / 2))
}

/// Re-writes a live connection's record with its expiry pushed forward.
/// Returns whether the record was refreshed.
pub async fn refresh_record(state: &AppState, record: &LiveRecord) -> bool {
    if current_owner(state, &record.connection_id).await.as_ref() != Some(&record.user_id) {
        return false;
    }
    let Some(repo) = state.clients.connection_repo().await else {
        return false;
    };
    let now = current_millis();
    let connection = Connection::expiring(
        &record.user_id,
        &record.connection_id,
        record.joined_at,
        now,
        state.config.connection_ttl_seconds,
    );
    if let Err(err) = repo.put(&connection).await {
        state.metrics.record_store_error();
        warn!(connection_id = %record.connection_id, "failed to refresh connection: {}", err);
        return false;
    }

    // The session may have closed or moved while the write was in flight.
    match current_owner(state, &record.connection_id).await {
        Some(owner) if owner == record.user_id => {
            state.sessions.mark_refreshed(&record.connection_id, now).await;
            state.metrics.record_refresh();
            debug!(connection_id = %record.connection_id, "connection record refreshed");
            true
        }
        Some(owner) => {
            // Our put evicted the new owner's record; write it back.
            let restored = Connection::new(
                &owner,
                &record.connection_id,
                now,
                state.config.connection_ttl_seconds,
            );
            if let Err(err) = repo.put(&restored).await {
                state.metrics.record_store_error();
                warn!(
                    connection_id = %record.connection_id,
                    "failed to restore moved connection: {}",
                    err
                );
            }
            false
        }
        None => {
            if let Err(err) = repo.remove(&record.user_id, &record.connection_id).await {
                state.metrics.record_store_error();
                warn!(connection_id = %record.connection_id, "failed to undo stale refresh: {}", err);
            }
            false
        }
    }
}

async fn current_owner(state: &AppState, connection_id: &ConnectionId) -> Option<UserId> {
    match state.sessions.state(connection_id).await {
        Some(ConnectionState::Active { user_id }) => Some(user_id),
        _ => None,
    }
}

pub async fn on_join(
    state: &AppState,
    connection_id: &ConnectionId,
    user_id: UserId,
) -> Result<ServerMessage, AppError> {
    let Some(transition) = state.sessions.activate(connection_id, &user_id).await else {
        state.metrics.record_rejected_message();
        return Err(AppError::BadRequest(format!(
            "connection '{}' is closed",
            connection_id
        )));
    };
    state.metrics.record_join();

    match state.clients.connection_repo().await {
        Some(repo) => {
            if let JoinTransition::Moved { previous } = &transition {
                if let Err(err) = repo.remove(previous, connection_id).await {
                    state.metrics.record_store_error();
                    warn!(
                        connection_id = %connection_id,
                        previous_user = %previous,
                        "failed to drop previous owner record: {}",
                        err
                    );
                }
            }

            let connection = Connection::new(
                &user_id,
                connection_id,
                current_millis(),
                state.config.connection_ttl_seconds,
            );
            match repo.put(&connection).await {
                Ok(()) => {
                    // A disconnect may have landed while the write was in flight.
                    if state.sessions.is_closed(connection_id).await {
                        if let Err(err) = repo.remove(&user_id, connection_id).await {
                            state.metrics.record_store_error();
                            warn!(connection_id = %connection_id, "failed to undo late join: {}", err);
                        }
                    }
                }
                Err(err) => {
                    state.metrics.record_store_error();
                    warn!(
                        connection_id = %connection_id,
                        user_id = %user_id,
                        "failed to record connection: {}",
                        err
                    );
                }
            }
        }
        None => debug!(connection_id = %connection_id, "connection tracking disabled"),
    }

    info!(connection_id = %connection_id, user_id = %user_id, "connection joined");
    Ok(ServerMessage::Joined {
        connection_id: connection_id.clone(),
        user_id,
    })
}

/// Idempotent. Store failures are logged, never returned.
pub async fn on_disconnect(state: &AppState, connection_id: &ConnectionId) {
    let previous = state.sessions.close(connection_id).await;
    state.metrics.record_disconnect();

    let owner = match previous {
        Some(ConnectionState::Active { user_id }) => Some(user_id),
        // Never joined, or already closed: nothing was written.
        Some(ConnectionState::Pending) | Some(ConnectionState::Closed) => {
            debug!(connection_id = %connection_id, "connection closed");
            return;
        }
        None => None,
    };

    let Some(repo) = state.clients.connection_repo().await else {
        return;
    };
    let result = match &owner {
        Some(user_id) => repo.remove(user_id, connection_id).await,
        None => repo.remove_connection(connection_id).await,
    };
    if let Err(err) = result {
        state.metrics.record_store_error();
        warn!(connection_id = %connection_id, "failed to remove connection: {}", err);
    }
    info!(connection_id = %connection_id, "connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use notify_domain::ConnectionRepository;

    use crate::test_support::{state_with, FakeStore};

    fn cid(value: &str) -> ConnectionId {
        ConnectionId(value.to_string())
    }

    fn join_body(user: &str) -> String {
        format!(r#"{{"action":"join","userId":"{}"}}"#, user)
    }

    #[tokio::test]
    async fn repeated_join_keeps_a_single_record() {
        let store = Arc::new(FakeStore::default());
        let state = state_with(Some(store.clone()), None);
        on_connect(&state, &cid("c1")).await;
        for _ in 0..3 {
            on_message(&state, &cid("c1"), &join_body("u1"))
                .await
                .expect("join");
        }
        assert_eq!(store.ids_for("u1"), vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn rejoin_under_another_user_moves_the_record() {
        let store = Arc::new(FakeStore::default());
        let state = state_with(Some(store.clone()), None);
        on_message(&state, &cid("c1"), &join_body("u1")).await.expect("join u1");
        on_message(&state, &cid("c1"), &join_body("u2")).await.expect("join u2");
        assert!(store.ids_for("u1").is_empty());
        assert_eq!(store.ids_for("u2"), vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn disconnect_removes_the_record() {
        let store = Arc::new(FakeStore::default());
        let state = state_with(Some(store.clone()), None);
        on_connect(&state, &cid("c1")).await;
        on_message(&state, &cid("c1"), &join_body("u1")).await.expect("join");
        on_disconnect(&state, &cid("c1")).await;
        assert!(store.ids_for("u1").is_empty());
        assert!(state.sessions.is_closed(&cid("c1")).await);
    }

    #[tokio::test]
    async fn disconnect_of_pending_connection_never_touches_store() {
        let store = Arc::new(FakeStore::default());
        let state = state_with(Some(store.clone()), None);
        on_connect(&state, &cid("c1")).await;
        on_disconnect(&state, &cid("c1")).await;
        on_disconnect(&state, &cid("c1")).await;
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn disconnect_of_unknown_connection_removes_by_id() {
        let store = Arc::new(FakeStore::default());
        store
            .put(&Connection::new(&UserId("u1".to_string()), &cid("c9"), 0, 0))
            .await
            .expect("seed");
        let state = state_with(Some(store.clone()), None);
        on_disconnect(&state, &cid("c9")).await;
        assert!(store.ids_for("u1").is_empty());
    }

    #[tokio::test]
    async fn malformed_join_is_rejected_without_state_change() {
        let store = Arc::new(FakeStore::default());
        let state = state_with(Some(store.clone()), None);
        on_connect(&state, &cid("c1")).await;

        let err = on_message(&state, &cid("c1"), r#"{"action":"join"}"#)
            .await
            .expect_err("missing user");
        assert_eq!(err.code(), "MISSING_USER_ID");
        let err = on_message(&state, &cid("c1"), "{oops").await.expect_err("garbage");
        assert_eq!(err.code(), "MALFORMED_MESSAGE");

        assert_eq!(state.sessions.state(&cid("c1")).await, Some(ConnectionState::Pending));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn join_after_disconnect_is_rejected() {
        let store = Arc::new(FakeStore::default());
        let state = state_with(Some(store.clone()), None);
        on_connect(&state, &cid("c1")).await;
        on_disconnect(&state, &cid("c1")).await;
        let err = on_message(&state, &cid("c1"), &join_body("u1"))
            .await
            .expect_err("closed");
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(store.ids_for("u1").is_empty());
    }

    #[tokio::test]
    async fn store_failures_do_not_fail_the_lifecycle() {
        let store = Arc::new(FakeStore::default());
        store.failing.store(true, Ordering::SeqCst);
        let state = state_with(Some(store.clone()), None);
        on_connect(&state, &cid("c1")).await;
        let reply = on_message(&state, &cid("c1"), &join_body("u1"))
            .await
            .expect("join still acknowledged");
        assert!(matches!(reply, ServerMessage::Joined { .. }));
        on_disconnect(&state, &cid("c1")).await;
        assert_eq!(state.metrics.store_errors(), 2);
    }

    #[tokio::test]
    async fn disconnect_during_join_write_leaves_no_record() {
        let store = Arc::new(FakeStore::default());
        store.delay_ms.store(50, Ordering::SeqCst);
        let state = state_with(Some(store.clone()), None);
        on_connect(&state, &cid("c1")).await;

        let joining = {
            let state = state.clone();
            tokio::spawn(async move { on_message(&state, &cid("c1"), &join_body("u1")).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        on_disconnect(&state, &cid("c1")).await;
        joining.await.expect("task").expect("join acknowledged");

        assert!(store.ids_for("u1").is_empty());
        assert!(state.sessions.is_closed(&cid("c1")).await);
    }

    #[tokio::test]
    async fn ping_refreshes_record_once_half_the_ttl_has_passed() {
        let store = Arc::new(FakeStore::default());
        let mut state = state_with(Some(store.clone()), None);
        state.config.connection_ttl_seconds = 1;
        on_message(&state, &cid("c1"), &join_body("u1")).await.expect("join");
        let joined = store.get("u1", "c1").expect("record");
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        on_message(&state, &cid("c1"), r#"{"action":"ping"}"#).await.expect("pong");

        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
        let refreshed = store.get("u1", "c1").expect("record");
        assert_eq!(refreshed.connected_at, joined.connected_at);
        assert!(refreshed.ttl > joined.ttl);
    }

    #[tokio::test]
    async fn ping_within_ttl_window_does_not_write() {
        let store = Arc::new(FakeStore::default());
        let state = state_with(Some(store.clone()), None);
        on_message(&state, &cid("c1"), &join_body("u1")).await.expect("join");
        on_message(&state, &cid("c1"), r#"{"action":"ping"}"#).await.expect("pong");
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_after_move_does_not_resurrect_old_owner() {
        let store = Arc::new(FakeStore::default());
        let state = state_with(Some(store.clone()), None);
        on_message(&state, &cid("c1"), &join_body("u1")).await.expect("join u1");
        let stale = LiveRecord {
            connection_id: cid("c1"),
            user_id: UserId("u1".to_string()),
            joined_at: 0,
        };
        on_message(&state, &cid("c1"), &join_body("u2")).await.expect("join u2");
        let calls = store.calls.load(Ordering::SeqCst);

        assert!(!refresh_record(&state, &stale).await);
        assert_eq!(store.calls.load(Ordering::SeqCst), calls);
        assert!(store.ids_for("u1").is_empty());
        assert_eq!(store.ids_for("u2"), vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn refresh_racing_a_disconnect_is_undone() {
        let store = Arc::new(FakeStore::default());
        let state = state_with(Some(store.clone()), None);
        on_message(&state, &cid("c1"), &join_body("u1")).await.expect("join");
        let record = state
            .sessions
            .touch(&cid("c1"), i64::MAX)
            .await
            .expect("due");
        store.delay_ms.store(50, Ordering::SeqCst);

        let refreshing = {
            let state = state.clone();
            tokio::spawn(async move { refresh_record(&state, &record).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        on_disconnect(&state, &cid("c1")).await;

        assert!(!refreshing.await.expect("task"));
        assert!(store.ids_for("u1").is_empty());
    }

    #[tokio::test]
    async fn ping_gets_pong() {
        let state = state_with(None, None);
        let reply = on_message(&state, &cid("c1"), r#"{"action":"ping"}"#)
            .await
            .expect("pong");
        assert_eq!(reply, ServerMessage::Pong);
    }
}
