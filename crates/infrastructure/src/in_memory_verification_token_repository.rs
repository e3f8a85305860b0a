use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use tessera_application::{NewVerificationToken, VerificationTokenRepository};
use tessera_core::{AppError, AppResult};
use tessera_domain::{TokenKind, TokenStatus, VerificationToken};

#[cfg(test)]
mod tests;

/// In-memory verification token repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryVerificationTokenRepository {
    tokens: RwLock<HashMap<(TokenKind, String), VerificationToken>>,
}

impl InMemoryVerificationTokenRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationTokenRepository for InMemoryVerificationTokenRepository {
    async fn create_token(&self, token: NewVerificationToken) -> AppResult<VerificationToken> {
        let kind = token.payload.kind();
        let key = (kind, token.token_hash.clone());
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "{} token hash already exists",
                kind.as_str()
            )));
        }

        let stored = VerificationToken {
            id: Uuid::new_v4(),
            kind,
            token_hash: token.token_hash,
            email: token.email,
            payload: token.payload,
            status: TokenStatus::Pending,
            expires_at: token.expires_at,
            created_at: token.created_at,
            resolved_at: None,
        };
        tokens.insert(key, stored.clone());

        Ok(stored)
    }

    async fn find_token(
        &self,
        kind: TokenKind,
        token_hash: &str,
    ) -> AppResult<Option<VerificationToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(&(kind, token_hash.to_owned())).cloned())
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

        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(&(kind, token_hash.to_owned())) {
            Some(token) if token.status == TokenStatus::Pending && !token.is_expired_at(now) => {
                token.status = to;
                token.resolved_at = Some(now);
                Ok(Some(token.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn expire_pending_token(
        &self,
        kind: TokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<VerificationToken>> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(&(kind, token_hash.to_owned())) {
            Some(token) if token.status == TokenStatus::Pending && token.is_expired_at(now) => {
                token.status = TokenStatus::Expired;
                token.resolved_at = Some(now);
                Ok(Some(token.clone()))
            }
            _ => Ok(None),
        }
    }
}
