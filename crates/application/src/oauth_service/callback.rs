use tessera_domain::{
    Capability, Connection, CredentialFields, ResponseType, ScopeIdentifierKind,
};

use super::*;
use crate::token_crypto::hash_token;
use crate::{AuthorizationGate, TokenGrant};

impl OAuthService {
    /// Completes a code-flow consent for the actor.
    ///
    /// The state is consumed atomically, so a replayed callback fails. A
    /// state with no stored record is accepted only for public-start
    /// providers, where it is the correlation id and serves as the fallback
    /// scoping identifier.
    pub async fn complete_authorization(
        &self,
        actor: &Principal,
        provider: Provider,
        params: &OAuthCallbackParams,
    ) -> AppResult<Connection> {
        AuthorizationGate::authorize(actor, Capability::ConnectionManageOwn)?;
        if let Some(error) = params.error.as_deref() {
            let description = params.error_description.as_deref().unwrap_or("no description");
            tracing::warn!(provider = %provider, error, "provider rejected consent");
            return Err(AppError::Validation(format!(
                "{provider} consent failed: {error} ({description})"
            )));
        }

        let descriptor = provider.descriptor();
        if descriptor.response_type != ResponseType::Code {
            return Err(AppError::Validation(format!(
                "{provider} returns tokens to the browser; save them through the connections endpoint"
            )));
        }

        let code = require_param(params.code.as_deref(), "code")?;
        let state = require_param(params.state.as_deref(), "state")?;
        let correlation_id = self.verify_state(actor, provider, state).await?;

        let client = self.clients.get(provider)?;
        let grant = self.exchanger.exchange_code(descriptor, client, code).await?;

        let owner = principal_owner(actor)?;
        let fields = self.credential_fields(provider, grant, correlation_id)?;
        let connection = self
            .connections
            .save_connection_for(&owner, &owner, provider, fields)
            .await?;

        tracing::info!(owner = %owner, provider = %provider, "oauth consent completed");
        Ok(connection)
    }

    /// Returns the correlation id when the state is not a stored nonce.
    async fn verify_state(
        &self,
        actor: &Principal,
        provider: Provider,
        state: &str,
    ) -> AppResult<Option<String>> {
        let Some(record) = self.state_repository.consume_state(&hash_token(state)).await? else {
            if provider.descriptor().public_start {
                return Ok(Some(state.to_owned()));
            }
            return Err(AppError::Validation(
                "OAuth state is unknown or was already used".to_owned(),
            ));
        };

        if record.expires_at <= self.clock.now() {
            return Err(AppError::Expired("OAuth state has expired".to_owned()));
        }
        if record.provider != provider {
            return Err(AppError::Validation(format!(
                "OAuth state was issued for {}",
                record.provider
            )));
        }
        if record.owner_email != actor.email() {
            tracing::warn!(actor = %actor.email(), provider = %provider, "oauth state owner mismatch");
            return Err(AppError::Forbidden(
                "OAuth state belongs to another user".to_owned(),
            ));
        }

        Ok(None)
    }

    fn credential_fields(
        &self,
        provider: Provider,
        grant: TokenGrant,
        correlation_id: Option<String>,
    ) -> AppResult<CredentialFields> {
        let expires_at = grant_expiry(provider, self.clock.now(), grant.expires_in)?;
        let scope_value = grant.scope_identifier.or(correlation_id);

        let mut fields = CredentialFields {
            access_token: Some(grant.access_token),
            refresh_token: grant.refresh_token,
            scopes: grant.scopes,
            expires_at,
            ..CredentialFields::default()
        };
        match provider.descriptor().scope_identifier {
            ScopeIdentifierKind::CloudId => fields.cloud_id = scope_value,
            ScopeIdentifierKind::TenantId => fields.tenant_id = scope_value,
            ScopeIdentifierKind::TeamId => fields.team_id = scope_value,
            ScopeIdentifierKind::ApiKey => fields.api_key = scope_value,
        }
        Ok(fields)
    }
}
