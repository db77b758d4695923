mod dashboard;
mod status;
mod users;

pub use dashboard::dashboard;
pub use status::{api_status, api_users, restart_service};
pub use users::{add_user, change_password, remove_user};

use axum::response::{IntoResponse, Redirect, Response};

// Form handlers report every outcome as a flash message carried through the
// redirect back to the dashboard.
pub(crate) fn flash_message(msg: &str) -> Response {
    Redirect::to(&format!("/?message={}", urlencoding::encode(msg))).into_response()
}

pub(crate) fn flash_error(msg: &str) -> Response {
    Redirect::to(&format!("/?error={}", urlencoding::encode(msg))).into_response()
}
