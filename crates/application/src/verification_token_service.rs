//! Single-use verification tokens for activation, invitation and password reset.
//!
//! Tokens are 256-bit random values; only their SHA-256 hash is stored.
//! Every state change is a conditional write, so a token is consumed at most
//! once even under concurrent redemption. Delivery is the caller's concern.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use tessera_core::{AppError, AppResult, Principal, Role};
use tessera_domain::{
    Capability, EmailAddress, TokenKind, TokenPayload, TokenStatus, VerificationToken,
    validity_window,
};

use crate::token_crypto::{generate_token, hash_token, is_well_formed};
use crate::{AuthorizationGate, Clock, NewVerificationToken, VerificationTokenRepository};

mod issue;
mod lifecycle;


/// Freshly issued token. The raw value exists only here and in the delivered link.
#[derive(Clone)]
pub struct IssuedToken {
    /// Stored record.
    pub token: VerificationToken,
    /// Raw token value for delivery.
    pub raw_token: String,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("IssuedToken")
            .field("token", &self.token)
            .field("raw_token", &"<redacted>")
            .finish()
    }
}

/// Application service managing verification token life cycles.
#[derive(Clone)]
pub struct VerificationTokenService {
    repository: Arc<dyn VerificationTokenRepository>,
    clock: Arc<dyn Clock>,
}

impl VerificationTokenService {
    /// Creates a new verification token service.
    #[must_use]
    pub fn new(repository: Arc<dyn VerificationTokenRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

/// Hashes a submitted raw token, rejecting values that cannot have been issued.
fn lookup_hash(raw_token: &str) -> AppResult<String> {
    let raw_token = raw_token.trim();
    if !is_well_formed(raw_token) {
        return Err(AppError::Validation("token is malformed".to_owned()));
    }
    Ok(hash_token(raw_token))
}

fn not_found(kind: TokenKind) -> AppError {
    AppError::NotFound(format!("{} token not found", kind.as_str()))
}
