use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use notify_domain::{
    Connection, ConnectionId, ConnectionRepository, DeliveryClient, DeliveryOutcome,
    RuntimeConfig, UserId,
};

use crate::{AppState, ClientHandles, LocalSessionHub};

pub fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: None,
        connections_table: Some("ws_connections".to_string()),
        delivery_endpoint: Some("local".to_string()),
        connection_ttl_seconds: 7200,
        sweep_interval_seconds: 0,
        closed_retention_seconds: 600,
        ws_max_message_bytes: 64 * 1024,
        max_body_bytes: 1024 * 1024,
        request_timeout_seconds: 5,
    }
}

pub fn state_with(
    store: Option<Arc<FakeStore>>,
    delivery: Option<Arc<FakeDelivery>>,
) -> AppState {
    let store = store.map(|store| store as Arc<dyn ConnectionRepository>);
    let delivery = delivery.map(|delivery| delivery as Arc<dyn DeliveryClient>);
    AppState::new(
        test_config(),
        ClientHandles::with_clients(store, delivery),
        Arc::new(LocalSessionHub::default()),
    )
}

/// Store double keyed by (user, connection) that counts every call.
/// `delay_ms` slows down writes and lookups.
#[derive(Default)]
pub struct FakeStore {
    records: Mutex<HashMap<(String, String), Connection>>,
    pub calls: AtomicUsize,
    pub failing: AtomicBool,
    pub delay_ms: AtomicU64,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl FakeStore {
    fn enter(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("store offline");
        }
        Ok(())
    }

    pub fn ids_for(&self, user_id: &str) -> Vec<String> {
        let records = self.records.lock().expect("records");
        let mut ids: Vec<String> = records
            .keys()
            .filter(|(user, _)| user == user_id)
            .map(|(_, connection)| connection.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn get(&self, user_id: &str, connection_id: &str) -> Option<Connection> {
        let records = self.records.lock().expect("records");
        records
            .get(&(user_id.to_string(), connection_id.to_string()))
            .cloned()
    }

    async fn pause(&self) {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay == 0 {
            return;
        }
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectionRepository for FakeStore {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        self.enter()
    }

    async fn put(&self, connection: &Connection) -> anyhow::Result<()> {
        self.enter()?;
        self.pause().await;
        let mut records = self.records.lock().expect("records");
        records.retain(|(_, id), _| id != &connection.connection_id);
        records.insert(
            (connection.user_id.clone(), connection.connection_id.clone()),
            connection.clone(),
        );
        Ok(())
    }

    async fn remove(&self, user_id: &UserId, connection_id: &ConnectionId) -> anyhow::Result<()> {
        self.enter()?;
        let mut records = self.records.lock().expect("records");
        records.remove(&(user_id.0.clone(), connection_id.0.clone()));
        Ok(())
    }

    async fn remove_connection(&self, connection_id: &ConnectionId) -> anyhow::Result<()> {
        self.enter()?;
        let mut records = self.records.lock().expect("records");
        records.retain(|(_, id), _| id != &connection_id.0);
        Ok(())
    }

    async fn list_by_user(&self, user_id: &UserId) -> anyhow::Result<Vec<Connection>> {
        self.enter()?;
        self.pause().await;
        let records = self.records.lock().expect("records");
        Ok(records
            .values()
            .filter(|connection| connection.user_id == user_id.0)
            .cloned()
            .collect())
    }

    async fn purge_expired(&self, now_seconds: i64) -> anyhow::Result<u64> {
        self.enter()?;
        let mut records = self.records.lock().expect("records");
        let before = records.len();
        records.retain(|_, connection| !connection.is_expired(now_seconds));
        Ok((before - records.len()) as u64)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.enter()
    }
}

/// Delivery double: scripted outcome per connection, `Delivered` otherwise.
#[derive(Default)]
pub struct FakeDelivery {
    outcomes: Mutex<HashMap<String, DeliveryOutcome>>,
    sent: Mutex<Vec<(String, String)>>,
}

impl FakeDelivery {
    pub fn script(&self, connection_id: &str, outcome: DeliveryOutcome) {
        self.outcomes
            .lock()
            .expect("outcomes")
            .insert(connection_id.to_string(), outcome);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        let mut sent = self.sent.lock().expect("sent").clone();
        sent.sort();
        sent
    }
}

#[async_trait]
impl DeliveryClient for FakeDelivery {
    async fn send(&self, connection_id: &ConnectionId, payload: &str) -> DeliveryOutcome {
        self.sent
            .lock()
            .expect("sent")
            .push((connection_id.0.clone(), payload.to_string()));
        self.outcomes
            .lock()
            .expect("outcomes")
            .get(&connection_id.0)
            .cloned()
            .unwrap_or(DeliveryOutcome::Delivered)
    }

    fn mode(&self) -> &'static str {
        "fake"
    }
}
