use chrono::{Duration, Utc};
use tessera_application::{NewVerificationToken, VerificationTokenRepository};
use tessera_core::{AppError, Role};
use tessera_domain::{TokenKind, TokenPayload, TokenStatus};

use super::InMemoryVerificationTokenRepository;

fn invitation(hash: &str, expires_in: Duration) -> NewVerificationToken {
    let now = Utc::now();
    NewVerificationToken {
        token_hash: hash.to_owned(),
        email: "new@example.com".to_owned(),
        payload: TokenPayload::Invitation {
            role: Role::Member,
            workspace_id: "ws-1".to_owned(),
            invited_by: "admin@example.com".to_owned(),
        },
        expires_at: now + expires_in,
        created_at: now,
    }
}

#[tokio::test]
async fn resolution_applies_only_to_pending_unexpired_tokens() {
    let repository = InMemoryVerificationTokenRepository::new();
    repository
        .create_token(invitation("h1", Duration::hours(1)))
        .await
        .unwrap_or_else(|error| panic!("create failed: {error}"));

    let now = Utc::now();
    let accepted = repository
        .resolve_pending_token(TokenKind::Invitation, "h1", TokenStatus::Accepted, now)
        .await;
    assert!(matches!(accepted, Ok(Some(ref token)) if token.status == TokenStatus::Accepted));

    let rejected = repository
        .resolve_pending_token(TokenKind::Invitation, "h1", TokenStatus::Rejected, now)
        .await;
    assert!(matches!(rejected, Ok(None)));
}

#[tokio::test]
async fn invalid_transitions_are_refused() {
    let repository = InMemoryVerificationTokenRepository::new();
    repository
        .create_token(invitation("h2", Duration::hours(1)))
        .await
        .unwrap_or_else(|error| panic!("create failed: {error}"));

    let result = repository
        .resolve_pending_token(TokenKind::Invitation, "h2", TokenStatus::Used, Utc::now())
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn expiry_write_back_requires_elapsed_window() {
    let repository = InMemoryVerificationTokenRepository::new();
    repository
        .create_token(invitation("h3", Duration::hours(1)))
        .await
        .unwrap_or_else(|error| panic!("create failed: {error}"));

    let early = repository
        .expire_pending_token(TokenKind::Invitation, "h3", Utc::now())
        .await;
    assert!(matches!(early, Ok(None)));

    let late = repository
        .expire_pending_token(TokenKind::Invitation, "h3", Utc::now() + Duration::hours(2))
        .await;
    assert!(matches!(late, Ok(Some(ref token)) if token.status == TokenStatus::Expired));
}
