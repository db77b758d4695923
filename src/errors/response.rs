use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crate::errors::AppError;

// The IntoResponse trait implementation converts AppError into a well-formed
// HTTP response for the JSON endpoints. The HTML form handlers never rely on
// this path; they turn outcomes into flash messages themselves.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            // Caller mistakes map to client errors
            AppError::InvalidUsername(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateUser(_) => StatusCode::CONFLICT,
            AppError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceNotAllowed(_) => StatusCode::FORBIDDEN,

            // Failures of the external tools are gateway-class errors
            AppError::ToolFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        };

        (status, self.to_string()).into_response()
    }
}
