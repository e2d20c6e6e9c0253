use axum::Router;

use notify_application::AppState;

use crate::handlers::{
    connection_handlers, gateway_handlers, notify_handlers, ops_handlers, ws_handlers,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/ws", axum::routing::get(ws_handlers::ws_connect))
        .route(
            "/v1/gateway/connections/:connection_id/connect",
            axum::routing::post(gateway_handlers::gateway_connect),
        )
        .route(
            "/v1/gateway/connections/:connection_id/disconnect",
            axum::routing::post(gateway_handlers::gateway_disconnect),
        )
        .route(
            "/v1/gateway/connections/:connection_id/message",
            axum::routing::post(gateway_handlers::gateway_message),
        )
        .route(
            "/v1/notify",
            axum::routing::post(notify_handlers::notify_user),
        )
        .route(
            "/v1/notify/batch",
            axum::routing::post(notify_handlers::notify_users),
        )
        .route(
            "/v1/users/:user_id/connections",
            axum::routing::get(connection_handlers::list_user_connections),
        )
        .route(
            "/v1/connections/:connection_id",
            axum::routing::get(connection_handlers::get_connection_state),
        )
        .route(
            "/v1/ops/health/live",
            axum::routing::get(ops_handlers::health_live),
        )
        .route(
            "/v1/ops/health/ready",
            axum::routing::get(ops_handlers::health_ready),
        )
        .route(
            "/v1/ops/status",
            axum::routing::get(ops_handlers::service_status),
        )
        .route(
            "/v1/ops/metrics/prometheus",
            axum::routing::get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
