pub mod client_factory;
pub mod gateway_delivery;
pub mod local_delivery;
pub mod sweep_service;

pub use client_factory::*;
pub use gateway_delivery::*;
pub use local_delivery::*;
pub use sweep_service::*;
