pub mod connection_queries;
pub mod health_queries;
