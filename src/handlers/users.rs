use axum::{
    extract::{Form, Path, State},
    response::Response,
};
use tracing;

use crate::config::Config;
use crate::handlers::{flash_error, flash_message};
use crate::models::{AddUserForm, ChangePasswordForm};
use crate::services::{CredentialStore, StatusMonitor};

pub async fn add_user(
    State((store, _, _)): State<(CredentialStore, StatusMonitor, Config)>,
    Form(form): Form<AddUserForm>,
) -> Response {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return flash_error("Username and password are required");
    }

    match store.add_user(username, &form.password).await {
        Ok(msg) => flash_message(&msg),
        Err(e) => {
            tracing::warn!("Add user '{}' failed: {}", username, e);
            flash_error(&e.to_string())
        }
    }
}

pub async fn remove_user(
    State((store, _, _)): State<(CredentialStore, StatusMonitor, Config)>,
    Path(username): Path<String>,
) -> Response {
    match store.remove_user(&username).await {
        Ok(msg) => flash_message(&msg),
        Err(e) => {
            tracing::warn!("Remove user '{}' failed: {}", username, e);
            flash_error(&e.to_string())
        }
    }
}

pub async fn change_password(
    State((store, _, _)): State<(CredentialStore, StatusMonitor, Config)>,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    let username = form.username.trim();
    if username.is_empty() || form.new_password.is_empty() {
        return flash_error("Username and new password are required");
    }

    match store.change_password(username, &form.new_password).await {
        Ok(msg) => flash_message(&msg),
        Err(e) => {
            tracing::warn!("Change password for '{}' failed: {}", username, e);
            flash_error(&e.to_string())
        }
    }
}
