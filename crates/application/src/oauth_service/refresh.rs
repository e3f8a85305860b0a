use tessera_domain::{Connection, CredentialRefresh};

use super::*;

impl OAuthService {
    /// Redeems the stored refresh token and swaps in the new access token.
    pub async fn refresh_connection(
        &self,
        actor: &Principal,
        provider: Provider,
    ) -> AppResult<Connection> {
        let connection = self.connections.find_active_connection(actor, provider).await?;
        let descriptor = provider.descriptor();
        if descriptor.token_endpoint.is_none() {
            return Err(AppError::Validation(format!(
                "{provider} tokens cannot be refreshed"
            )));
        }
        let refresh_token = connection.credentials.refresh_token.as_deref().ok_or_else(|| {
            AppError::Validation(format!("{provider} connection has no refresh token"))
        })?;

        let client = self.clients.get(provider)?;
        let grant = self
            .exchanger
            .refresh_token(descriptor, client, refresh_token)
            .await?;

        let refresh = CredentialRefresh {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: grant_expiry(provider, self.clock.now(), grant.expires_in)?,
        };
        let refreshed = self.connections.apply_refresh(actor, provider, refresh).await?;

        tracing::info!(owner = %actor.email(), provider = %provider, "connection refreshed");
        Ok(refreshed)
    }
}
