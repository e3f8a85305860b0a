use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tessera_core::{AppError, AppResult, Principal, Role};
use tessera_domain::{TokenKind, TokenStatus, WorkspaceMembership};

use super::{MembershipRepository, MembershipService};
use crate::VerificationTokenService;
use crate::test_support::{FakeTokenRepository, ManualClock};

#[derive(Default)]
struct TestMembershipRepo {
    memberships: Mutex<Vec<WorkspaceMembership>>,
    unavailable: AtomicBool,
}

fn lock_error<T>(error: std::sync::PoisonError<T>) -> AppError {
    AppError::Internal(format!("failed to lock membership state: {error}"))
}

#[async_trait]
impl MembershipRepository for TestMembershipRepo {
    async fn upsert_membership(
        &self,
        membership: WorkspaceMembership,
    ) -> AppResult<WorkspaceMembership> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("membership store unavailable".to_owned()));
        }
        let mut memberships = self.memberships.lock().map_err(lock_error)?;
        memberships.retain(|existing| {
            !(existing.workspace_id == membership.workspace_id && existing.email == membership.email)
        });
        memberships.push(membership.clone());
        Ok(membership)
    }

    async fn update_member_role(
        &self,
        workspace_id: &str,
        email: &str,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<WorkspaceMembership>> {
        let mut memberships = self.memberships.lock().map_err(lock_error)?;
        Ok(memberships
            .iter_mut()
            .find(|membership| membership.workspace_id == workspace_id && membership.email == email)
            .map(|membership| {
                membership.role = role;
                membership.updated_at = updated_at;
                membership.clone()
            }))
    }

    async fn find_membership(
        &self,
        workspace_id: &str,
        email: &str,
    ) -> AppResult<Option<WorkspaceMembership>> {
        Ok(self
            .memberships
            .lock()
            .map_err(lock_error)?
            .iter()
            .find(|membership| membership.workspace_id == workspace_id && membership.email == email)
            .cloned())
    }
}

struct Harness {
    repository: Arc<TestMembershipRepo>,
    memberships: MembershipService,
    tokens: VerificationTokenService,
    token_repo: Arc<FakeTokenRepository>,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new());
    let token_repo = Arc::new(FakeTokenRepository::default());
    let tokens = VerificationTokenService::new(token_repo.clone(), clock.clone());
    let repository = Arc::new(TestMembershipRepo::default());
    let memberships = MembershipService::new(repository.clone(), tokens.clone(), clock);
    Harness {
        repository,
        memberships,
        tokens,
        token_repo,
    }
}

fn admin() -> Principal {
    Principal::new("admin@example.com", Role::Admin)
}

#[tokio::test]
async fn accepting_invitation_grants_invited_role_once() {
    let harness = harness();
    let issued = harness
        .tokens
        .issue_invitation(&admin(), "New@Example.com", Role::Contributor, "ws-1", Duration::days(7))
        .await
        .unwrap_or_else(|error| panic!("issue failed: {error}"));

    let membership = harness
        .memberships
        .accept_invitation(&issued.raw_token)
        .await
        .unwrap_or_else(|error| panic!("accept failed: {error}"));
    assert_eq!(membership.workspace_id, "ws-1");
    assert_eq!(membership.email, "new@example.com");
    assert_eq!(membership.role, Role::Contributor);
    assert_eq!(
        harness.token_repo.status_of(issued.token.id),
        Some(TokenStatus::Accepted)
    );

    let again = harness.memberships.accept_invitation(&issued.raw_token).await;
    assert!(matches!(again, Err(AppError::AlreadyConsumed(_))));
}

#[tokio::test]
async fn failed_membership_write_leaves_invitation_spent() {
    let harness = harness();
    let issued = harness
        .tokens
        .issue_invitation(&admin(), "new@example.com", Role::Member, "ws-1", Duration::days(7))
        .await
        .unwrap_or_else(|error| panic!("issue failed: {error}"));

    harness.repository.unavailable.store(true, Ordering::SeqCst);
    let accept = harness.memberships.accept_invitation(&issued.raw_token).await;
    assert!(matches!(accept, Err(AppError::Internal(_))));
    assert_eq!(
        harness.token_repo.status_of(issued.token.id),
        Some(TokenStatus::Accepted)
    );

    harness.repository.unavailable.store(false, Ordering::SeqCst);
    let retry = harness.memberships.accept_invitation(&issued.raw_token).await;
    assert!(matches!(retry, Err(AppError::AlreadyConsumed(_))));

    let reissued = harness
        .tokens
        .issue_invitation(&admin(), "new@example.com", Role::Member, "ws-1", Duration::days(7))
        .await
        .unwrap_or_else(|error| panic!("issue failed: {error}"));
    let membership = harness
        .memberships
        .accept_invitation(&reissued.raw_token)
        .await
        .unwrap_or_else(|error| panic!("accept failed: {error}"));
    assert_eq!(membership.role, Role::Member);
}

#[tokio::test]
async fn rejected_invitation_grants_nothing() {
    let harness = harness();
    let issued = harness
        .tokens
        .issue_invitation(&admin(), "new@example.com", Role::Member, "ws-1", Duration::days(7))
        .await
        .unwrap_or_else(|error| panic!("issue failed: {error}"));
    harness
        .tokens
        .reject(TokenKind::Invitation, &issued.raw_token)
        .await
        .unwrap_or_else(|error| panic!("reject failed: {error}"));

    let accept = harness.memberships.accept_invitation(&issued.raw_token).await;
    assert!(matches!(accept, Err(AppError::AlreadyConsumed(_))));
    let membership = harness
        .memberships
        .find_membership("ws-1", "new@example.com")
        .await
        .unwrap_or_else(|error| panic!("lookup failed: {error}"));
    assert!(membership.is_none());
}

#[tokio::test]
async fn role_update_requires_admin_and_existing_member() {
    let harness = harness();
    let member = Principal::new("bob@example.com", Role::Member);

    let forbidden = harness
        .memberships
        .update_member_role(&member, "ws-1", "new@example.com", Role::Admin)
        .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    let missing = harness
        .memberships
        .update_member_role(&admin(), "ws-1", "new@example.com", Role::Admin)
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let issued = harness
        .tokens
        .issue_invitation(&admin(), "new@example.com", Role::Member, "ws-1", Duration::days(7))
        .await
        .unwrap_or_else(|error| panic!("issue failed: {error}"));
    harness
        .memberships
        .accept_invitation(&issued.raw_token)
        .await
        .unwrap_or_else(|error| panic!("accept failed: {error}"));

    let updated = harness
        .memberships
        .update_member_role(&admin(), "ws-1", "New@Example.com", Role::Admin)
        .await;
    assert!(matches!(updated, Ok(ref membership) if membership.role == Role::Admin));
}
