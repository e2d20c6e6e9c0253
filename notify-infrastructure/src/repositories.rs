pub mod clickhouse_connections;
pub mod memory_connections;

pub use clickhouse_connections::*;
pub use memory_connections::*;
