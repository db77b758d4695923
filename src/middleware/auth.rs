//! HTTP Basic access gate for the dashboard.
//!
//! Stateless: there are no sessions or tokens, every request re-presents the
//! administrator credentials. Both fields are compared in constant time, and
//! every failure mode produces the same generic challenge so the response
//! gives nothing away about which part was wrong.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;

use crate::config::AdminConfig;

/// Constant-time equality. A length mismatch returns false immediately, which
/// leaks only the length, not any prefix of the secret.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Check a supplied identity pair against the configured administrator.
/// `&` rather than `&&` so the password comparison always runs.
pub fn authenticate(admin: &AdminConfig, username: &str, password: &str) -> bool {
    constant_time_eq(username.as_bytes(), admin.username.as_bytes())
        & constant_time_eq(password.as_bytes(), admin.password.as_bytes())
}

pub async fn require_auth(
    State(admin): State<AdminConfig>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match credentials_from_request(&req) {
        Some((username, password)) if authenticate(&admin, &username, &password) => {
            next.run(req).await
        }
        _ => challenge(),
    }
}

/// Parse `Authorization: Basic base64(user:pass)` from the request, if any.
fn credentials_from_request(req: &Request<Body>) -> Option<(String, String)> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ").or_else(|| value.strip_prefix("basic "))?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"Proxy Dashboard\"")],
        "Authentication required",
    )
        .into_response()
}
