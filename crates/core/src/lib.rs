//! Shared primitives for all Rust crates in Tessera.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{Principal, Role};

/// Result type used across Tessera crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// No principal could be resolved for the request.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Principal is known but lacks the required role or ownership.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A conditional write lost a race against a concurrent writer.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A time-boxed secret is past its validity window.
    #[error("expired: {0}")]
    Expired(String),

    /// A single-use secret already reached a terminal state.
    #[error("already consumed: {0}")]
    AlreadyConsumed(String),

    /// Required environment configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A third-party provider call failed or returned non-success.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns a stable machine-readable code for transport payloads.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Expired(_) => "expired",
            Self::AlreadyConsumed(_) => "already_consumed",
            Self::Configuration(_) => "configuration_error",
            Self::Upstream(_) => "upstream_error",
            Self::Internal(_) => "unknown",
        }
    }
}
