use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use std::fs;
use tracing;

use crate::config::Config;
use crate::errors::AppResult;
use crate::models::FlashParams;
use crate::services::{CredentialStore, StatusMonitor};

/// Main dashboard page: user table, status snapshot, and any flash message
/// carried back through the redirect query string.
pub async fn dashboard(
    State((store, monitor, _config)): State<(CredentialStore, StatusMonitor, Config)>,
    Query(flash): Query<FlashParams>,
) -> AppResult<Response> {
    let users = store.list_users().await?;
    let snapshot = monitor.get_status().await;

    let template = fs::read_to_string("templates/index.html").unwrap_or_else(|e| {
        tracing::error!("Failed to read dashboard template: {}", e);
        "Error loading dashboard page".to_string()
    });

    let users_html = users
        .iter()
        .map(|user| {
            format!(
                r#"<tr>
                    <td>{user}</td>
                    <td class="action-cell">
                        <form method="post" action="/remove_user/{user}"
                              onsubmit="return confirm('Remove user {user}?');">
                            <button type="submit" class="delete-btn">Remove</button>
                        </form>
                    </td>
                </tr>"#
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let status_html = snapshot
        .services
        .iter()
        .map(|(name, state)| {
            format!(
                r#"<tr>
                    <td>{}</td>
                    <td class="state-{}">{}</td>
                </tr>"#,
                name,
                state.as_str(),
                state.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let flash_html = if let Some(msg) = flash.message {
        format!(r#"<div class="flash success">{}</div>"#, msg)
    } else if let Some(msg) = flash.error {
        format!(r#"<div class="flash error">{}</div>"#, msg)
    } else {
        String::new()
    };

    let page = template
        .replace("{{flash}}", &flash_html)
        .replace("{{users}}", &users_html)
        .replace("{{status}}", &status_html)
        .replace("{{user_count}}", &snapshot.user_count.to_string())
        .replace("{{timestamp}}", &snapshot.timestamp);

    Ok(Html(page).into_response())
}
