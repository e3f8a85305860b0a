use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tessera_core::AppError;

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);

        let message = match &self.0 {
            AppError::Configuration(_) | AppError::Internal(_) => {
                tracing::error!(error = %self.0, "request failed");
                "internal server error".to_owned()
            }
            AppError::Upstream(_) => {
                tracing::warn!(error = %self.0, "provider call failed");
                self.0.to_string()
            }
            _ => self.0.to_string(),
        };

        (status, Json(ErrorResponse::new(self.0.code(), message))).into_response()
    }
}

fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation(_) | AppError::Expired(_) | AppError::AlreadyConsumed(_) => {
            StatusCode::BAD_REQUEST
        }
        AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        AppError::Configuration(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
