use super::*;

impl VerificationTokenService {
    /// Reads a token and checks that it is still pending and unexpired.
    ///
    /// An invitation observed past its window is written back as `expired`.
    pub async fn validate(&self, kind: TokenKind, raw_token: &str) -> AppResult<VerificationToken> {
        let token_hash = lookup_hash(raw_token)?;
        let token = self
            .repository
            .find_token(kind, &token_hash)
            .await?
            .ok_or_else(|| not_found(kind))?;

        let now = self.clock.now();
        if token.status == TokenStatus::Pending
            && token.is_expired_at(now)
            && kind.persists_expiry()
        {
            self.persist_expiry(kind, &token_hash, now).await?;
        }

        token.ensure_pending(now)?;
        Ok(token)
    }

    /// Consumes a token, moving it to the kind's consumed status.
    pub async fn consume(&self, kind: TokenKind, raw_token: &str) -> AppResult<VerificationToken> {
        self.resolve(kind, raw_token, kind.consumed_status()).await
    }

    /// Declines an invitation without performing its action.
    pub async fn reject(&self, kind: TokenKind, raw_token: &str) -> AppResult<VerificationToken> {
        if !kind.supports_rejection() {
            return Err(AppError::Validation(format!(
                "{} tokens cannot be rejected",
                kind.as_str()
            )));
        }
        self.resolve(kind, raw_token, TokenStatus::Rejected).await
    }

    async fn resolve(
        &self,
        kind: TokenKind,
        raw_token: &str,
        to: TokenStatus,
    ) -> AppResult<VerificationToken> {
        let token_hash = lookup_hash(raw_token)?;
        let now = self.clock.now();

        if let Some(token) = self
            .repository
            .resolve_pending_token(kind, &token_hash, to, now)
            .await?
        {
            tracing::info!(token_id = %token.id, kind = kind.as_str(), status = to.as_str(), "verification token resolved");
            return Ok(token);
        }

        // The conditional write did not apply; re-read to report why.
        let token = self
            .repository
            .find_token(kind, &token_hash)
            .await?
            .ok_or_else(|| not_found(kind))?;
        if token.status == TokenStatus::Pending
            && token.is_expired_at(now)
            && kind.persists_expiry()
        {
            self.persist_expiry(kind, &token_hash, now).await?;
        }
        token.ensure_pending(now)?;

        // Unreachable for adapters that apply the write with the same `now` as
        // one conditional update; only a repository that evaluates expiry
        // against its own clock or splits the write can land here.
        Err(AppError::Conflict(format!(
            "{} token changed concurrently",
            kind.as_str()
        )))
    }

    async fn persist_expiry(
        &self,
        kind: TokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if let Some(token) = self
            .repository
            .expire_pending_token(kind, token_hash, now)
            .await?
        {
            tracing::info!(token_id = %token.id, kind = kind.as_str(), "verification token expired");
        }
        Ok(())
    }
}
