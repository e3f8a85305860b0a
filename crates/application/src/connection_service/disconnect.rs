use tessera_domain::DisconnectPolicy;

use super::*;

impl ConnectionService {
    /// Disconnects the actor from a provider according to its disconnect policy.
    ///
    /// Providers with [`DisconnectPolicy::Deactivate`] keep the record as
    /// history and require the shared-revoke capability.
    pub async fn disconnect(
        &self,
        actor: &Principal,
        provider: Provider,
    ) -> AppResult<DisconnectOutcome> {
        match provider.descriptor().disconnect_policy {
            DisconnectPolicy::Delete => self.delete_own(actor, provider).await,
            DisconnectPolicy::Deactivate => self.deactivate_shared(actor, provider).await,
        }
    }

    async fn delete_own(
        &self,
        actor: &Principal,
        provider: Provider,
    ) -> AppResult<DisconnectOutcome> {
        AuthorizationGate::authorize(actor, Capability::ConnectionManageOwn)?;
        let deleted = self
            .repository
            .delete_owned_connections(actor.email(), provider)
            .await?;
        if deleted.is_empty() {
            return Err(AppError::NotFound(format!("no {provider} connection to remove")));
        }

        tracing::info!(owner = %actor.email(), provider = %provider, deleted = deleted.len(), "connection deleted");
        Ok(DisconnectOutcome::Deleted(deleted))
    }

    async fn deactivate_shared(
        &self,
        actor: &Principal,
        provider: Provider,
    ) -> AppResult<DisconnectOutcome> {
        let scope = AuthorizationGate::elevate(
            actor,
            Capability::ConnectionRevokeShared,
            "soft-revoke shared connection",
        )?;

        let connection = self
            .repository
            .find_active_connection_for_actor(&scope, actor.email(), provider)
            .await?
            .ok_or_else(|| no_active_connection(provider))?;

        if !self
            .repository
            .deactivate_connection(&scope, connection.id)
            .await?
        {
            return Err(no_active_connection(provider));
        }

        tracing::info!(
            actor = %actor.email(),
            owner = %connection.user_email,
            provider = %provider,
            connection_id = %connection.id,
            "connection deactivated"
        );
        Ok(DisconnectOutcome::Deactivated(connection.id))
    }
}
