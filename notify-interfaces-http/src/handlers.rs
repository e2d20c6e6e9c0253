pub mod connection_handlers;
pub mod gateway_handlers;
pub mod notify_handlers;
pub mod ops_handlers;
pub mod ws_handlers;

pub use connection_handlers::*;
pub use gateway_handlers::*;
pub use notify_handlers::*;
pub use ops_handlers::*;
pub use ws_handlers::*;
