use crate::AppState;

/// Ready when the connection store, if configured, answers a ping.
pub async fn check_ready(state: &AppState) -> anyhow::Result<()> {
    if let Some(repo) = state.clients.try_connection_repo().await? {
        repo.ping().await?;
    }
    Ok(())
}
