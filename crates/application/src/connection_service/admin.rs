use crate::ConnectionQuery;

use super::*;

impl ConnectionService {
    /// Lists connections across all owners.
    pub async fn list_all_connections(
        &self,
        actor: &Principal,
        query: &ConnectionQuery,
    ) -> AppResult<Vec<Connection>> {
        let scope = AuthorizationGate::elevate(
            actor,
            Capability::ConnectionListAll,
            "list all connections",
        )?;
        if query.limit == 0 {
            return Err(AppError::Validation("limit must be positive".to_owned()));
        }

        self.repository.list_all_connections(&scope, query).await
    }

    /// Deletes every connection of a provider across all owners.
    pub async fn delete_all_for_provider(
        &self,
        actor: &Principal,
        provider: Provider,
    ) -> AppResult<BulkDeleteResult> {
        let scope = AuthorizationGate::elevate(
            actor,
            Capability::ConnectionBulkDelete,
            "bulk delete provider connections",
        )?;
        let deleted_ids = self
            .repository
            .delete_connections_for_provider(&scope, provider)
            .await?;

        tracing::info!(
            actor = %actor.email(),
            provider = %provider,
            deleted = deleted_ids.len(),
            "provider connections deleted"
        );
        Ok(BulkDeleteResult {
            provider,
            deleted_ids,
        })
    }
}
