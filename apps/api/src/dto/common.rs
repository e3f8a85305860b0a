use serde::Serialize;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Generic message response for flows that must not leak outcome details.
#[derive(Debug, Serialize)]
pub struct GenericMessageResponse {
    pub message: String,
}
