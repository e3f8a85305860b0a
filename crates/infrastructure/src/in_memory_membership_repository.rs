use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use tessera_application::MembershipRepository;
use tessera_core::{AppResult, Role};
use tessera_domain::WorkspaceMembership;

/// In-memory membership repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryMembershipRepository {
    memberships: RwLock<HashMap<(String, String), WorkspaceMembership>>,
}

impl InMemoryMembershipRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MembershipRepository for InMemoryMembershipRepository {
    async fn upsert_membership(
        &self,
        membership: WorkspaceMembership,
    ) -> AppResult<WorkspaceMembership> {
        let key = (membership.workspace_id.clone(), membership.email.clone());
        self.memberships
            .write()
            .await
            .insert(key, membership.clone());
        Ok(membership)
    }

    async fn update_member_role(
        &self,
        workspace_id: &str,
        email: &str,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<WorkspaceMembership>> {
        let mut memberships = self.memberships.write().await;
        Ok(memberships
            .get_mut(&(workspace_id.to_owned(), email.to_owned()))
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
        let memberships = self.memberships.read().await;
        Ok(memberships
            .get(&(workspace_id.to_owned(), email.to_owned()))
            .cloned())
    }
}
