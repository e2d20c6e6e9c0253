// Notify Application Layer

pub mod clients;
pub mod commands;
pub mod error;
pub mod metrics;
pub mod ops;
pub mod queries;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use clients::{ClientHandles, StaticClients};
pub use error::AppError;
pub use metrics::Metrics;
pub use ops::{LocalPush, LocalSessionHub, SessionTracker};
pub use state::AppState;
