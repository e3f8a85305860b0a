use chrono::Duration;
use tessera_domain::{Capability, ResponseType};

use super::*;
use crate::token_crypto::generate_token;
use crate::{AuthorizationGate, OAuthStateRecord};

impl OAuthService {
    /// Starts consent for the actor with a fresh single-use state nonce.
    ///
    /// Code-flow providers persist the nonce hash so the callback can bind the
    /// result to the actor. Implicit-flow providers return tokens to the
    /// browser and the frontend submits them through the save endpoint.
    pub async fn begin_authorization(
        &self,
        actor: &Principal,
        provider: Provider,
        scopes: &[String],
    ) -> AppResult<AuthorizationRedirect> {
        AuthorizationGate::authorize(actor, Capability::ConnectionManageOwn)?;
        let descriptor = provider.descriptor();
        let client = self.clients.get(provider)?;

        let (nonce, state_hash) = generate_token()?;
        let url = build_authorization_url(
            descriptor,
            client,
            scopes,
            &AuthorizationState::Nonce(nonce),
        )?;

        let state_expires_at = if descriptor.response_type == ResponseType::Code {
            let created_at = self.clock.now();
            let expires_at = created_at + Duration::minutes(OAUTH_STATE_VALIDITY_MINUTES);
            self.state_repository
                .save_state(OAuthStateRecord {
                    state_hash,
                    provider,
                    owner_email: actor.email().to_owned(),
                    created_at,
                    expires_at,
                })
                .await?;
            Some(expires_at)
        } else {
            None
        };

        tracing::info!(owner = %actor.email(), provider = %provider, "oauth consent started");
        Ok(AuthorizationRedirect {
            provider,
            url,
            state_expires_at,
        })
    }

    /// Starts consent before the user has a host session, carrying a
    /// caller-supplied correlation id as `state`.
    ///
    /// Only providers flagged for public start accept this. The callback
    /// cannot verify such a state, so it offers no CSRF protection.
    pub fn begin_public_authorization(
        &self,
        provider: Provider,
        correlation_id: &str,
    ) -> AppResult<AuthorizationRedirect> {
        let descriptor = provider.descriptor();
        if !descriptor.public_start {
            return Err(AppError::Forbidden(format!(
                "{provider} consent requires a signed-in user"
            )));
        }

        let client = self.clients.get(provider)?;
        let url = build_authorization_url(
            descriptor,
            client,
            &[],
            &AuthorizationState::Correlation(correlation_id.trim().to_owned()),
        )?;

        tracing::info!(provider = %provider, "public oauth consent started");
        Ok(AuthorizationRedirect {
            provider,
            url,
            state_expires_at: None,
        })
    }
}
