// Domain entities

pub mod config;
pub mod connection;
pub mod notification;
pub mod protocol;

pub use config::*;
pub use connection::*;
pub use notification::*;
pub use protocol::*;
