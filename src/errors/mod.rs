// Error taxonomy for the dashboard, built on thiserror. Every variant is
// recoverable at the request boundary; nothing here crashes the process.
use thiserror::Error;

// Make the response module public
pub mod response;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid username '{0}': use only letters, numbers, and underscores")]
    InvalidUsername(String),

    #[error("User '{0}' already exists")]
    DuplicateUser(String),

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("Service '{0}' is not managed by this dashboard")]
    ServiceNotAllowed(String),

    #[error("External tool failed: {0}")]
    ToolFailure(String),

    #[error("Credential file unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Command timed out after {0} seconds")]
    Timeout(u64),
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
