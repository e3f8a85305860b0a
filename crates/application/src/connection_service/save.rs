use tessera_domain::{ConnectionCredentials, CredentialFields, EmailAddress};

use super::*;

impl ConnectionService {
    /// Validates and stores the actor's credentials for a provider,
    /// replacing any prior active connection.
    pub async fn save_connection(
        &self,
        actor: &Principal,
        provider: Provider,
        fields: CredentialFields,
    ) -> AppResult<Connection> {
        AuthorizationGate::authorize(actor, Capability::ConnectionManageOwn)?;
        let owner = EmailAddress::new(actor.email())?;
        self.save_connection_for(&owner, &owner, provider, fields)
            .await
    }

    /// Stores credentials for `owner`. `created_by` differs from the owner
    /// when the record is written on someone's behalf.
    pub(crate) async fn save_connection_for(
        &self,
        owner: &EmailAddress,
        created_by: &EmailAddress,
        provider: Provider,
        fields: CredentialFields,
    ) -> AppResult<Connection> {
        let credentials = ConnectionCredentials::from_fields(provider, fields)?;
        let connection =
            Connection::connect(owner, created_by, provider, credentials, self.clock.now());

        let replaced = self.repository.replace_active_connection(connection).await?;
        tracing::info!(
            owner = %owner,
            provider = %provider,
            connection_id = %replaced.connection.id,
            replaced = replaced.replaced_ids.len(),
            "connection saved"
        );

        Ok(replaced.connection)
    }
}
