//! PostgreSQL-backed verification token repository.
//!
//! Transitions are single conditional `UPDATE ... RETURNING` statements, so
//! exactly one concurrent caller observes the returned row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tessera_application::{NewVerificationToken, VerificationTokenRepository};
use tessera_core::{AppError, AppResult};
use tessera_domain::{TokenKind, TokenPayload, TokenStatus, VerificationToken};


const TOKEN_COLUMNS: &str =
    "id, kind, token_hash, email, payload, status, expires_at, created_at, resolved_at";

/// PostgreSQL implementation of the verification token repository port.
#[derive(Clone)]
pub struct PostgresVerificationTokenRepository {
    pool: PgPool,
}

impl PostgresVerificationTokenRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationTokenRepository for PostgresVerificationTokenRepository {
    async fn create_token(&self, token: NewVerificationToken) -> AppResult<VerificationToken> {
        let payload = serde_json::to_value(&token.payload).map_err(|error| {
            AppError::Internal(format!("failed to serialize token payload: {error}"))
        })?;

        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "INSERT INTO verification_tokens (kind, token_hash, email, payload, expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(token.payload.kind().as_str())
        .bind(token.token_hash.as_str())
        .bind(token.email.as_str())
        .bind(payload)
        .bind(token.expires_at)
        .bind(token.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create verification token: {error}"))
        })?;

        row.into_token()
    }

    async fn find_token(
        &self,
        kind: TokenKind,
        token_hash: &str,
    ) -> AppResult<Option<VerificationToken>> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM verification_tokens WHERE kind = $1 AND token_hash = $2"
        ))
        .bind(kind.as_str())
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find verification token: {error}"))
        })?;

        row.map(TokenRow::into_token).transpose()
    }

    async fn resolve_pending_token(
        &self,
        kind: TokenKind,
        token_hash: &str,
        to: TokenStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<VerificationToken>> {
        if !TokenStatus::Pending.can_transition(kind, to) {
            return Err(AppError::Validation(format!(
                "{} tokens cannot move to {}",
                kind.as_str(),
                to.as_str()
            )));
        }

        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "UPDATE verification_tokens \
             SET status = $3, resolved_at = $4 \
             WHERE kind = $1 AND token_hash = $2 AND status = 'pending' AND expires_at > $4 \
             RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(kind.as_str())
        .bind(token_hash)
        .bind(to.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve verification token: {error}"))
        })?;

        row.map(TokenRow::into_token).transpose()
    }

    async fn expire_pending_token(
        &self,
        kind: TokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<VerificationToken>> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "UPDATE verification_tokens \
             SET status = 'expired', resolved_at = $3 \
             WHERE kind = $1 AND token_hash = $2 AND status = 'pending' AND expires_at <= $3 \
             RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(kind.as_str())
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to expire verification token: {error}"))
        })?;

        row.map(TokenRow::into_token).transpose()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    id: Uuid,
    kind: String,
    token_hash: String,
    email: String,
    payload: serde_json::Value,
    status: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TokenRow {
    fn into_token(self) -> AppResult<VerificationToken> {
        let kind = self.kind.parse::<TokenKind>()?;
        let payload: TokenPayload = serde_json::from_value(self.payload).map_err(|error| {
            AppError::Internal(format!("invalid payload on token {}: {error}", self.id))
        })?;
        if payload.kind() != kind {
            return Err(AppError::Internal(format!(
                "token {} stores a {} payload under kind {}",
                self.id,
                payload.kind().as_str(),
                kind.as_str()
            )));
        }

        Ok(VerificationToken {
            id: self.id,
            kind,
            token_hash: self.token_hash,
            email: self.email,
            payload,
            status: TokenStatus::parse(&self.status)?,
            expires_at: self.expires_at,
            created_at: self.created_at,
            resolved_at: self.resolved_at,
        })
    }
}
