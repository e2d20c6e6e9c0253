use std::sync::atomic::{AtomicU64, Ordering};

use notify_domain::BroadcastReport;

#[derive(Debug, Default)]
pub struct Metrics {
    connections_opened: AtomicU64,
    joins: AtomicU64,
    rejected_messages: AtomicU64,
    disconnects: AtomicU64,
    store_errors: AtomicU64,
    broadcasts: AtomicU64,
    deliveries_delivered: AtomicU64,
    deliveries_gone: AtomicU64,
    deliveries_failed: AtomicU64,
    records_purged: AtomicU64,
    records_refreshed: AtomicU64,
    stale_removed: AtomicU64,
}

impl Metrics {
    pub fn record_connect(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_join(&self) {
        self.joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_message(&self) {
        self.rejected_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast(&self, report: &BroadcastReport) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        self.deliveries_delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.deliveries_gone
            .fetch_add(report.gone as u64, Ordering::Relaxed);
        self.deliveries_failed
            .fetch_add(report.failed as u64, Ordering::Relaxed);
    }

    pub fn record_purged(&self, count: u64) {
        self.records_purged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_refresh(&self) {
        self.records_refreshed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_removed(&self) {
        self.stale_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stale_removed(&self) -> u64 {
        self.stale_removed.load(Ordering::Relaxed)
    }

    pub fn store_errors(&self) -> u64 {
        self.store_errors.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let counters = [
            ("hr_notify_connections_opened_total", &self.connections_opened),
            ("hr_notify_joins_total", &self.joins),
            ("hr_notify_rejected_messages_total", &self.rejected_messages),
            ("hr_notify_disconnects_total", &self.disconnects),
            ("hr_notify_store_errors_total", &self.store_errors),
            ("hr_notify_broadcasts_total", &self.broadcasts),
            ("hr_notify_deliveries_delivered_total", &self.deliveries_delivered),
            ("hr_notify_deliveries_gone_total", &self.deliveries_gone),
            ("hr_notify_deliveries_failed_total", &self.deliveries_failed),
            ("hr_notify_records_purged_total", &self.records_purged),
            ("hr_notify_records_refreshed_total", &self.records_refreshed),
            (
                "hr_notify_stale_connections_removed_total",
                &self.stale_removed,
            ),
        ];

        let mut out = String::new();
        for (name, counter) in counters {
            out.push_str(&format!(
                "# TYPE {name} counter\n{name} {}\n",
                counter.load(Ordering::Relaxed)
            ));
        }
        out
    }
}
