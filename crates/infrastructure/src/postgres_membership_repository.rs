//! PostgreSQL-backed workspace membership repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tessera_application::MembershipRepository;
use tessera_core::{AppError, AppResult, Role};
use tessera_domain::WorkspaceMembership;

/// PostgreSQL implementation of the membership repository port.
#[derive(Clone)]
pub struct PostgresMembershipRepository {
    pool: PgPool,
}

impl PostgresMembershipRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    async fn upsert_membership(
        &self,
        membership: WorkspaceMembership,
    ) -> AppResult<WorkspaceMembership> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            INSERT INTO workspace_memberships (workspace_id, email, role, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (workspace_id, email)
            DO UPDATE SET role = EXCLUDED.role, updated_at = EXCLUDED.updated_at
            RETURNING workspace_id, email, role, updated_at
            "#,
        )
        .bind(membership.workspace_id.as_str())
        .bind(membership.email.as_str())
        .bind(membership.role.as_str())
        .bind(membership.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to upsert membership: {error}")))?;

        row.into_membership()
    }

    async fn update_member_role(
        &self,
        workspace_id: &str,
        email: &str,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<WorkspaceMembership>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            UPDATE workspace_memberships
            SET role = $3, updated_at = $4
            WHERE workspace_id = $1
              AND email = $2
            RETURNING workspace_id, email, role, updated_at
            "#,
        )
        .bind(workspace_id)
        .bind(email)
        .bind(role.as_str())
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update member role: {error}")))?;

        row.map(MembershipRow::into_membership).transpose()
    }

    async fn find_membership(
        &self,
        workspace_id: &str,
        email: &str,
    ) -> AppResult<Option<WorkspaceMembership>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT workspace_id, email, role, updated_at
            FROM workspace_memberships
            WHERE workspace_id = $1
              AND email = $2
            "#,
        )
        .bind(workspace_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find membership: {error}")))?;

        row.map(MembershipRow::into_membership).transpose()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    workspace_id: String,
    email: String,
    role: String,
    updated_at: DateTime<Utc>,
}

impl MembershipRow {
    fn into_membership(self) -> AppResult<WorkspaceMembership> {
        Ok(WorkspaceMembership {
            role: self.role.parse()?,
            workspace_id: self.workspace_id,
            email: self.email,
            updated_at: self.updated_at,
        })
    }
}
