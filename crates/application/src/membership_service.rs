//! Workspace memberships created by accepted invitations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tessera_core::{AppError, AppResult, Principal, Role};
use tessera_domain::{Capability, EmailAddress, TokenKind, TokenPayload, WorkspaceMembership};

use crate::{AuthorizationGate, Clock, VerificationTokenService};

#[cfg(test)]
mod tests;

/// Repository port for workspace memberships.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Inserts or overwrites the member's role in a workspace.
    async fn upsert_membership(
        &self,
        membership: WorkspaceMembership,
    ) -> AppResult<WorkspaceMembership>;

    /// Changes an existing member's role. Returns `None` when no membership exists.
    async fn update_member_role(
        &self,
        workspace_id: &str,
        email: &str,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<WorkspaceMembership>>;

    /// Finds one membership.
    async fn find_membership(
        &self,
        workspace_id: &str,
        email: &str,
    ) -> AppResult<Option<WorkspaceMembership>>;
}

/// Application service for invitation acceptance and role changes.
#[derive(Clone)]
pub struct MembershipService {
    repository: Arc<dyn MembershipRepository>,
    tokens: VerificationTokenService,
    clock: Arc<dyn Clock>,
}

impl MembershipService {
    /// Creates a new membership service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn MembershipRepository>,
        tokens: VerificationTokenService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            tokens,
            clock,
        }
    }

    /// Accepts an invitation and grants the invited role.
    ///
    /// The token is consumed first; a lost race never grants membership.
    /// The two writes are separate store calls: if the membership write fails
    /// the invitation stays accepted, a retry fails with `AlreadyConsumed`
    /// and the invitation has to be sent again.
    pub async fn accept_invitation(&self, raw_token: &str) -> AppResult<WorkspaceMembership> {
        let token = self.tokens.consume(TokenKind::Invitation, raw_token).await?;
        let TokenPayload::Invitation {
            role, workspace_id, ..
        } = token.payload
        else {
            return Err(AppError::Internal(format!(
                "invitation token {} carries a {} payload",
                token.id,
                token.payload.kind().as_str()
            )));
        };

        let token_id = token.id;
        let membership = self
            .repository
            .upsert_membership(WorkspaceMembership {
                workspace_id,
                email: token.email,
                role,
                updated_at: self.clock.now(),
            })
            .await
            .inspect_err(|error| {
                tracing::error!(
                    %token_id,
                    error = %error,
                    "invitation consumed but membership was not stored"
                );
            })?;

        tracing::info!(
            workspace_id = %membership.workspace_id,
            email = %membership.email,
            role = %membership.role,
            "invitation accepted"
        );
        Ok(membership)
    }

    /// Changes a member's role. Requires the role-update capability.
    pub async fn update_member_role(
        &self,
        actor: &Principal,
        workspace_id: &str,
        email: &str,
        role: Role,
    ) -> AppResult<WorkspaceMembership> {
        AuthorizationGate::authorize(actor, Capability::MemberRoleUpdate)?;
        let email = EmailAddress::new(email)?;

        let membership = self
            .repository
            .update_member_role(workspace_id, email.as_str(), role, self.clock.now())
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("{email} is not a member of workspace {workspace_id}"))
            })?;

        tracing::info!(
            actor = %actor.email(),
            workspace_id = %workspace_id,
            email = %email,
            role = %role,
            "member role updated"
        );
        Ok(membership)
    }

    /// Returns a membership if it exists.
    pub async fn find_membership(
        &self,
        workspace_id: &str,
        email: &str,
    ) -> AppResult<Option<WorkspaceMembership>> {
        let email = EmailAddress::new(email)?;
        self.repository
            .find_membership(workspace_id, email.as_str())
            .await
    }
}
