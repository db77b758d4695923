use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AddUserForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    pub username: String,
    pub new_password: String,
}

/// Flash message carried back to the dashboard through the redirect query
/// string, mirroring the `?error=` / `?message=` convention of the form
/// handlers.
#[derive(Debug, Deserialize, Default)]
pub struct FlashParams {
    pub message: Option<String>,
    pub error: Option<String>,
}
