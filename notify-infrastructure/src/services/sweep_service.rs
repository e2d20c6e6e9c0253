use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use notify_application::commands::lifecycle_commands::{refresh_cutoff, refresh_record};
use notify_application::AppState;
use notify_domain::{current_millis, current_seconds};

/// How long an open session may stay silent when records never expire.
const UNBOUNDED_IDLE_SECONDS: u64 = 24 * 60 * 60;

/// Periodically refreshes live records, drops expired ones and forgets
/// closed or idle sessions. Returns at once when the interval is zero.
pub async fn schedule_sweeps(state: AppState) {
    let interval = state.config.sweep_interval_seconds;
    if interval == 0 {
        info!("sweeper disabled");
        return;
    }
    loop {
        sleep(Duration::from_secs(interval)).await;
        sweep_once(&state).await;
    }
}

pub async fn sweep_once(state: &AppState) {
    // Sockets this process still holds are alive whether or not they ping.
    let live = state.local_hub.connection_ids().await;

    if let Some(cutoff) = refresh_cutoff(state) {
        let mut refreshed = 0usize;
        for record in state.sessions.due_for_refresh(cutoff, &live).await {
            if refresh_record(state, &record).await {
                refreshed += 1;
            }
        }
        if refreshed > 0 {
            debug!("refreshed {} live connection records", refreshed);
        }
    }

    if let Some(repo) = state.clients.connection_repo().await {
        match repo.purge_expired(current_seconds()).await {
            Ok(purged) => {
                state.metrics.record_purged(purged);
                if purged > 0 {
                    info!("purged {} expired connection records", purged);
                }
            }
            Err(err) => {
                state.metrics.record_store_error();
                warn!("connection sweep failed: {}", err);
            }
        }
    }

    let now = current_millis();
    let retention_millis = (state.config.closed_retention_seconds as i64).saturating_mul(1000);
    let idle_seconds = match state.config.connection_ttl_seconds {
        0 => UNBOUNDED_IDLE_SECONDS,
        ttl => ttl,
    };
    let idle_millis = (idle_seconds as i64).saturating_mul(1000);
    let pruned = state
        .sessions
        .prune(
            now.saturating_sub(retention_millis),
            now.saturating_sub(idle_millis),
            &live,
        )
        .await;
    if pruned > 0 {
        debug!("forgot {} closed or idle sessions", pruned);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use notify_application::commands::lifecycle_commands::{on_connect, on_message};
    use notify_application::commands::notify_commands::broadcast;
    use notify_application::{ClientHandles, LocalSessionHub};
    use notify_domain::{
        BroadcastStatus, Connection, ConnectionId, ConnectionRepository, DeliveryClient,
        RuntimeConfig, UserId,
    };
    use serde_json::json;

    use super::*;
    use crate::repositories::InMemoryConnectionRepository;
    use crate::services::LocalDeliveryClient;

    fn config() -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            api_token: None,
            connections_table: Some("ws_connections".to_string()),
            delivery_endpoint: Some("local".to_string()),
            connection_ttl_seconds: 60,
            sweep_interval_seconds: 0,
            closed_retention_seconds: 0,
            ws_max_message_bytes: 1024,
            max_body_bytes: 1024,
            request_timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn sweep_purges_expired_and_prunes_closed() {
        let repo = Arc::new(InMemoryConnectionRepository::new());
        let expired = Connection {
            connection_id: "old".to_string(),
            user_id: "u1".to_string(),
            connected_at: 0,
            ttl: Some(1),
        };
        let fresh = Connection::new(
            &UserId("u1".to_string()),
            &ConnectionId("new".to_string()),
            current_millis(),
            3600,
        );
        repo.put(&expired).await.expect("put");
        repo.put(&fresh).await.expect("put");
        let store: Arc<dyn ConnectionRepository> = repo.clone();

        let state = AppState::new(
            config(),
            ClientHandles::with_clients(Some(store), None),
            Arc::default(),
        );
        let closed = ConnectionId("gone".to_string());
        state.sessions.open(&closed).await;
        state.sessions.close(&closed).await;
        sleep(Duration::from_millis(5)).await;

        sweep_once(&state).await;

        let left = repo
            .list_by_user(&UserId("u1".to_string()))
            .await
            .expect("list");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].connection_id, "new");
        assert!(state.sessions.state(&closed).await.is_none());
    }

    fn local_state(
        repo: &Arc<InMemoryConnectionRepository>,
        ttl_seconds: u64,
    ) -> (AppState, Arc<LocalSessionHub>) {
        let hub = Arc::new(LocalSessionHub::default());
        let store: Arc<dyn ConnectionRepository> = repo.clone();
        let delivery: Arc<dyn DeliveryClient> = Arc::new(LocalDeliveryClient::new(hub.clone()));
        let mut state = AppState::new(
            config(),
            ClientHandles::with_clients(Some(store), Some(delivery)),
            hub.clone(),
        );
        state.config.connection_ttl_seconds = ttl_seconds;
        (state, hub)
    }

    async fn join(state: &AppState, connection_id: &ConnectionId, user: &str) {
        on_connect(state, connection_id).await;
        on_message(
            state,
            connection_id,
            &format!(r#"{{"action":"join","userId":"{}"}}"#, user),
        )
        .await
        .expect("join");
    }

    #[tokio::test]
    async fn open_socket_outlives_its_initial_ttl() {
        let repo = Arc::new(InMemoryConnectionRepository::new());
        let (state, hub) = local_state(&repo, 1);
        let held = ConnectionId("held".to_string());
        let (_tx, mut rx) = hub.register(&held).await;
        join(&state, &held, "u1").await;

        sleep(Duration::from_millis(1200)).await;
        sweep_once(&state).await;

        let report = broadcast(&state, &UserId("u1".to_string()), &json!({"type": "ping"})).await;
        assert_eq!(report.status, BroadcastStatus::Completed);
        assert_eq!(report.delivered, 1);
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn record_without_socket_expires() {
        let repo = Arc::new(InMemoryConnectionRepository::new());
        let (state, _hub) = local_state(&repo, 1);
        join(&state, &ConnectionId("dropped".to_string()), "u1").await;

        sleep(Duration::from_millis(1200)).await;
        sweep_once(&state).await;

        let report = broadcast(&state, &UserId("u1".to_string()), &json!({"type": "ping"})).await;
        assert_eq!(report.status, BroadcastStatus::NoConnections);
    }

    #[tokio::test]
    async fn idle_sessions_without_socket_are_forgotten() {
        let repo = Arc::new(InMemoryConnectionRepository::new());
        let (state, hub) = local_state(&repo, 1);
        let held = ConnectionId("held".to_string());
        let (_tx, _rx) = hub.register(&held).await;
        on_connect(&state, &held).await;
        for n in 0..1000 {
            on_connect(&state, &ConnectionId(format!("abandoned-{}", n))).await;
        }

        sleep(Duration::from_millis(1100)).await;
        sweep_once(&state).await;

        let counts = state.sessions.counts().await;
        assert_eq!(counts.pending, 1);
        assert!(state.sessions.state(&held).await.is_some());
    }

    #[tokio::test]
    async fn zero_interval_returns_immediately() {
        let state = AppState::new(config(), ClientHandles::with_clients(None, None), Arc::default());
        tokio::time::timeout(Duration::from_secs(1), schedule_sweeps(state))
            .await
            .expect("returns");
    }
}
