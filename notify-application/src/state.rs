use std::sync::Arc;

use notify_domain::RuntimeConfig;

use crate::{ClientHandles, LocalSessionHub, Metrics, SessionTracker};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub clients: Arc<ClientHandles>,
    pub sessions: Arc<SessionTracker>,
    pub local_hub: Arc<LocalSessionHub>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: RuntimeConfig,
        clients: ClientHandles,
        local_hub: Arc<LocalSessionHub>,
    ) -> Self {
        Self {
            config,
            clients: Arc::new(clients),
            sessions: Arc::new(SessionTracker::default()),
            local_hub,
            metrics: Arc::new(Metrics::default()),
        }
    }
}
