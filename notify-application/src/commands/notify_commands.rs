use std::collections::HashSet;

use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use notify_domain::{
    BroadcastReport, BroadcastStatus, ConnectionId, ConnectionRepository, DeliveryClient,
    DeliveryOutcome, NotifyBatchRequest, NotifyRequest, UserId,
};

use crate::{AppError, AppState};

const MAX_BATCH_USERS: usize = 5_000;
/// Users broadcast to at once within a batch.
const MAX_CONCURRENT_BROADCASTS: usize = 32;

pub async fn notify(state: &AppState, request: NotifyRequest) -> Result<BroadcastReport, AppError> {
    let user_id = UserId::parse(&request.user_id)
        .ok_or_else(|| AppError::BadRequest("userId is required".to_string()))?;
    validate_payload(&request.payload)?;
    Ok(broadcast(state, &user_id, &request.payload).await)
}

pub async fn notify_batch(
    state: &AppState,
    request: NotifyBatchRequest,
) -> Result<Vec<BroadcastReport>, AppError> {
    if request.user_ids.is_empty() {
        return Err(AppError::BadRequest("userIds must not be empty".to_string()));
    }
    if request.user_ids.len() > MAX_BATCH_USERS {
        return Err(AppError::BadRequest(format!(
            "at most {} userIds per batch",
            MAX_BATCH_USERS
        )));
    }
    let mut user_ids = Vec::with_capacity(request.user_ids.len());
    for raw in &request.user_ids {
        let user_id = UserId::parse(raw)
            .ok_or_else(|| AppError::BadRequest("userIds must not contain blanks".to_string()))?;
        user_ids.push(user_id);
    }
    validate_payload(&request.payload)?;
    Ok(broadcast_many(state, &user_ids, &request.payload).await)
}

fn validate_payload(payload: &Value) -> Result<(), AppError> {
    if payload.is_null() {
        return Err(AppError::BadRequest("payload is required".to_string()));
    }
    Ok(())
}

/// Delivers `payload` to every tracked connection of `user_id`. Never fails;
/// the report is for observability only.
pub async fn broadcast(state: &AppState, user_id: &UserId, payload: &Value) -> BroadcastReport {
    let report = fan_out(state, user_id, payload).await;
    state.metrics.record_broadcast(&report);
    report
}

/// One broadcast per distinct user, in request order, with at most
/// `MAX_CONCURRENT_BROADCASTS` in flight.
pub async fn broadcast_many(
    state: &AppState,
    user_ids: &[UserId],
    payload: &Value,
) -> Vec<BroadcastReport> {
    let mut seen = HashSet::new();
    let distinct = user_ids
        .iter()
        .filter(|user_id| seen.insert(*user_id))
        .collect::<Vec<_>>();
    let broadcasts = distinct
        .into_iter()
        .map(|user_id| broadcast(state, user_id, payload))
        .collect::<Vec<_>>();
    stream::iter(broadcasts)
        .buffered(MAX_CONCURRENT_BROADCASTS)
        .collect()
        .await
}

async fn fan_out(state: &AppState, user_id: &UserId, payload: &Value) -> BroadcastReport {
    // Checked before the store so an unconfigured endpoint never costs a lookup.
    let delivery = match state.clients.try_delivery_client().await {
        Ok(Some(delivery)) => delivery,
        Ok(None) => {
            debug!(user_id = %user_id, "broadcast skipped: no delivery endpoint");
            return BroadcastReport::empty(user_id.as_str(), BroadcastStatus::Disabled);
        }
        Err(err) => {
            warn!(user_id = %user_id, "broadcast skipped: delivery client unavailable: {}", err);
            return BroadcastReport::empty(user_id.as_str(), BroadcastStatus::Disabled);
        }
    };

    let repo = match state.clients.try_connection_repo().await {
        Ok(Some(repo)) => repo,
        Ok(None) => {
            debug!(user_id = %user_id, "broadcast skipped: no connection table");
            return BroadcastReport::empty(user_id.as_str(), BroadcastStatus::Disabled);
        }
        Err(err) => {
            state.metrics.record_store_error();
            warn!(user_id = %user_id, "broadcast skipped: connection store unavailable: {}", err);
            return BroadcastReport::empty(user_id.as_str(), BroadcastStatus::StoreUnavailable);
        }
    };

    let connections = match repo.list_by_user(user_id).await {
        Ok(connections) => connections,
        Err(err) => {
            state.metrics.record_store_error();
            warn!(user_id = %user_id, "failed to list connections: {}", err);
            return BroadcastReport::empty(user_id.as_str(), BroadcastStatus::StoreUnavailable);
        }
    };
    if connections.is_empty() {
        return BroadcastReport::empty(user_id.as_str(), BroadcastStatus::NoConnections);
    }

    let body = payload.to_string();
    let outcomes = join_all(connections.iter().map(|connection| {
        deliver_one(
            state,
            repo.as_ref(),
            delivery.as_ref(),
            user_id,
            connection.id(),
            &body,
        )
    }))
    .await;

    let mut report = BroadcastReport::empty(user_id.as_str(), BroadcastStatus::Completed);
    report.recipients = connections.len();
    for outcome in outcomes {
        match outcome {
            DeliveryOutcome::Delivered => report.delivered += 1,
            DeliveryOutcome::Gone => report.gone += 1,
            DeliveryOutcome::TransientError(_) => report.failed += 1,
        }
    }
    debug!(
        user_id = %user_id,
        mode = delivery.mode(),
        recipients = report.recipients,
        delivered = report.delivered,
        gone = report.gone,
        failed = report.failed,
        "broadcast finished"
    );
    report
}

async fn deliver_one(
    state: &AppState,
    repo: &dyn ConnectionRepository,
    delivery: &dyn DeliveryClient,
    user_id: &UserId,
    connection_id: ConnectionId,
    body: &str,
) -> DeliveryOutcome {
    let outcome = delivery.send(&connection_id, body).await;
    match &outcome {
        DeliveryOutcome::Delivered => {}
        DeliveryOutcome::Gone => {
            info!(user_id = %user_id, connection_id = %connection_id, "pruning stale connection");
            match repo.remove(user_id, &connection_id).await {
                Ok(()) => state.metrics.record_stale_removed(),
                Err(err) => {
                    state.metrics.record_store_error();
                    warn!(
                        connection_id = %connection_id,
                        "failed to prune stale connection: {}",
                        err
                    );
                }
            }
        }
        DeliveryOutcome::TransientError(reason) => {
            warn!(
                user_id = %user_id,
                connection_id = %connection_id,
                "delivery failed: {}",
                reason
            );
        }
    }
    outcome
}
