use axum::{
    extract::{Path, State},
    response::{Json, Response},
};
use tracing;

use crate::config::Config;
use crate::errors::AppResult;
use crate::handlers::{flash_error, flash_message};
use crate::models::{StatusSnapshot, UserList};
use crate::services::{CredentialStore, StatusMonitor};

/// Machine-readable status endpoint. Never fails: degraded services and an
/// unreadable store both show up inside the snapshot instead.
pub async fn api_status(
    State((_, monitor, _)): State<(CredentialStore, StatusMonitor, Config)>,
) -> Json<StatusSnapshot> {
    Json(monitor.get_status().await)
}

pub async fn api_users(
    State((store, _, _)): State<(CredentialStore, StatusMonitor, Config)>,
) -> AppResult<Json<UserList>> {
    let users = store.list_users().await?;
    Ok(Json(UserList { users }))
}

pub async fn restart_service(
    State((_, monitor, _)): State<(CredentialStore, StatusMonitor, Config)>,
    Path(service): Path<String>,
) -> Response {
    match monitor.restart_service(&service).await {
        Ok(msg) => flash_message(&msg),
        Err(e) => {
            tracing::warn!("Restart of '{}' failed: {}", service, e);
            flash_error(&e.to_string())
        }
    }
}
