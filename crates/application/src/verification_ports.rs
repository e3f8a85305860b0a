use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tessera_core::AppResult;
use tessera_domain::{TokenKind, TokenPayload, TokenStatus, VerificationToken};

/// Token about to be persisted. The raw value never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVerificationToken {
    /// SHA-256 hash of the raw token.
    pub token_hash: String,
    /// Subject email.
    pub email: String,
    /// Kind-specific payload; determines the token kind.
    pub payload: TokenPayload,
    /// End of the validity window.
    pub expires_at: DateTime<Utc>,
    /// Issuance timestamp.
    pub created_at: DateTime<Utc>,
}

/// Repository port for verification token persistence.
///
/// Transitions are conditional writes: they apply only when the stored
/// record still satisfies the stated precondition, so concurrent callers
/// cannot both succeed.
#[async_trait]
pub trait VerificationTokenRepository: Send + Sync {
    /// Stores a new pending token.
    async fn create_token(&self, token: NewVerificationToken) -> AppResult<VerificationToken>;

    /// Looks a token up by kind and hash.
    async fn find_token(
        &self,
        kind: TokenKind,
        token_hash: &str,
    ) -> AppResult<Option<VerificationToken>>;

    /// Moves a pending, unexpired token to `to`. Returns `None` when the
    /// precondition no longer holds.
    async fn resolve_pending_token(
        &self,
        kind: TokenKind,
        token_hash: &str,
        to: TokenStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<VerificationToken>>;

    /// Marks a pending token whose window has passed as `expired`.
    async fn expire_pending_token(
        &self,
        kind: TokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<VerificationToken>>;
}
