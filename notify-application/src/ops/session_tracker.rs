use std::collections::{HashMap, HashSet};

use notify_domain::{current_millis, ConnectionId, ConnectionState, UserId};
use serde::Serialize;
use tokio::sync::RwLock;

/// What a successful join did to the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinTransition {
    Fresh,
    Rejoined,
    Moved { previous: UserId },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounts {
    pub pending: usize,
    pub active: usize,
    pub closed: usize,
}

#[derive(Debug, Clone)]
struct TrackedSession {
    state: ConnectionState,
    /// Last lifecycle event or client frame.
    updated_at: i64,
    /// When the store record's ttl was last pushed forward.
    refreshed_at: i64,
    joined_at: i64,
}

impl TrackedSession {
    fn new(state: ConnectionState) -> Self {
        let now = current_millis();
        Self {
            state,
            updated_at: now,
            refreshed_at: now,
            joined_at: now,
        }
    }
}

/// An active connection whose store record needs its ttl extended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRecord {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub joined_at: i64,
}

/// Per-instance lifecycle state of the connections this process has seen.
/// Closed connections stay as tombstones until pruned so a late join cannot
/// revive them.
#[derive(Default)]
pub struct SessionTracker {
    sessions: RwLock<HashMap<ConnectionId, TrackedSession>>,
}

impl SessionTracker {
    pub async fn open(&self, connection_id: &ConnectionId) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(connection_id.clone())
            .or_insert_with(|| TrackedSession::new(ConnectionState::Pending));
    }

    pub async fn state(&self, connection_id: &ConnectionId) -> Option<ConnectionState> {
        let sessions = self.sessions.read().await;
        sessions.get(connection_id).map(|session| session.state.clone())
    }

    pub async fn is_closed(&self, connection_id: &ConnectionId) -> bool {
        matches!(
            self.state(connection_id).await,
            Some(ConnectionState::Closed)
        )
    }

    /// Moves the connection to `Active`. Unknown connections count as
    /// `Pending`. Returns `None` for closed connections.
    pub async fn activate(
        &self,
        connection_id: &ConnectionId,
        user_id: &UserId,
    ) -> Option<JoinTransition> {
        let mut sessions = self.sessions.write().await;
        let transition = match sessions.get(connection_id).map(|session| &session.state) {
            Some(ConnectionState::Closed) => return None,
            Some(ConnectionState::Active { user_id: previous }) if previous == user_id => {
                JoinTransition::Rejoined
            }
            Some(ConnectionState::Active { user_id: previous }) => JoinTransition::Moved {
                previous: previous.clone(),
            },
            Some(ConnectionState::Pending) | None => JoinTransition::Fresh,
        };
        sessions.insert(
            connection_id.clone(),
            TrackedSession::new(ConnectionState::Active {
                user_id: user_id.clone(),
            }),
        );
        Some(transition)
    }

    /// Records client activity. Returns the record to refresh when the
    /// connection is active and was last refreshed before `refresh_before`.
    pub async fn touch(
        &self,
        connection_id: &ConnectionId,
        refresh_before: i64,
    ) -> Option<LiveRecord> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(connection_id)?;
        if session.state == ConnectionState::Closed {
            return None;
        }
        session.updated_at = current_millis();
        due_record(connection_id, session, refresh_before)
    }

    /// Active connections among `live` whose records were last refreshed
    /// before `refresh_before`.
    pub async fn due_for_refresh(
        &self,
        refresh_before: i64,
        live: &HashSet<ConnectionId>,
    ) -> Vec<LiveRecord> {
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .filter(|(connection_id, _)| live.contains(*connection_id))
            .filter_map(|(connection_id, session)| {
                due_record(connection_id, session, refresh_before)
            })
            .collect()
    }

    pub async fn mark_refreshed(&self, connection_id: &ConnectionId, at: i64) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(connection_id) {
            session.refreshed_at = session.refreshed_at.max(at);
        }
    }

    /// Marks the connection closed and returns the state it had before,
    /// `None` if this instance never saw it.
    pub async fn close(&self, connection_id: &ConnectionId) -> Option<ConnectionState> {
        let mut sessions = self.sessions.write().await;
        sessions
            .insert(
                connection_id.clone(),
                TrackedSession::new(ConnectionState::Closed),
            )
            .map(|previous| previous.state)
    }

    /// Drops closed tombstones last touched before `closed_before`, and open
    /// connections idle since before `idle_before` unless they are in `keep`.
    pub async fn prune(
        &self,
        closed_before: i64,
        idle_before: i64,
        keep: &HashSet<ConnectionId>,
    ) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|connection_id, session| match session.state {
            ConnectionState::Closed => session.updated_at >= closed_before,
            _ => session.updated_at >= idle_before || keep.contains(connection_id),
        });
        before - sessions.len()
    }

    pub async fn counts(&self) -> SessionCounts {
        let sessions = self.sessions.read().await;
        let mut counts = SessionCounts::default();
        for session in sessions.values() {
            match session.state {
                ConnectionState::Pending => counts.pending += 1,
                ConnectionState::Active { .. } => counts.active += 1,
                ConnectionState::Closed => counts.closed += 1,
            }
        }
        counts
    }
}

fn due_record(
    connection_id: &ConnectionId,
    session: &TrackedSession,
    refresh_before: i64,
) -> Option<LiveRecord> {
    match &session.state {
        ConnectionState::Active { user_id } if session.refreshed_at < refresh_before => {
            Some(LiveRecord {
                connection_id: connection_id.clone(),
                user_id: user_id.clone(),
                joined_at: session.joined_at,
            })
        }
        _ => None,
    }
}
