use std::collections::HashMap;
use std::sync::Arc;

use tessera_application::{
    Clock, ConnectionService, EmailService, MembershipService, OAuthClientConfig, OAuthClients,
    OAuthService, OAuthTokenExchanger, ProviderProxyService, ProviderResourceClient, SystemClock,
    TokenDeliveryService, VerificationTokenService,
};
use tessera_core::AppError;
use tessera_domain::Provider;
use tessera_infrastructure::{HttpOAuthTokenExchanger, HttpProviderResourceClient};

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::email::build_email_service;

mod repositories;

pub use repositories::StorePorts;

/// Outbound adapters the services talk through.
pub struct ServiceAdapters {
    pub email_service: Arc<dyn EmailService>,
    pub token_exchanger: Arc<dyn OAuthTokenExchanger>,
    pub resource_client: Arc<dyn ProviderResourceClient>,
    pub clock: Arc<dyn Clock>,
}

pub fn build_app_state(ports: StorePorts, config: &ApiConfig) -> Result<AppState, AppError> {
    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let adapters = ServiceAdapters {
        email_service: build_email_service(config)?,
        token_exchanger: Arc::new(HttpOAuthTokenExchanger::new(http_client.clone())),
        resource_client: Arc::new(HttpProviderResourceClient::new(http_client)),
        clock: Arc::new(SystemClock),
    };

    let configured = config
        .oauth_clients
        .keys()
        .map(Provider::as_str)
        .collect::<Vec<_>>();
    tracing::info!(providers = ?configured, "oauth clients configured");

    Ok(assemble_app_state(
        ports,
        adapters,
        config.oauth_clients.clone(),
        config,
    ))
}

pub(crate) fn assemble_app_state(
    ports: StorePorts,
    adapters: ServiceAdapters,
    oauth_clients: HashMap<Provider, OAuthClientConfig>,
    config: &ApiConfig,
) -> AppState {
    let connection_service =
        ConnectionService::new(ports.connection_repository, adapters.clock.clone());
    let verification_token_service =
        VerificationTokenService::new(ports.token_repository, adapters.clock.clone());

    AppState {
        oauth_service: OAuthService::new(
            Arc::new(OAuthClients::new(oauth_clients)),
            ports.oauth_state_repository,
            adapters.token_exchanger,
            connection_service.clone(),
            adapters.clock.clone(),
        ),
        provider_proxy_service: ProviderProxyService::new(
            connection_service.clone(),
            adapters.resource_client,
            adapters.clock.clone(),
        ),
        token_delivery_service: TokenDeliveryService::new(
            verification_token_service.clone(),
            adapters.email_service,
            config.frontend_url.clone(),
            config.email_from_name.clone(),
        ),
        membership_service: MembershipService::new(
            ports.membership_repository,
            verification_token_service.clone(),
            adapters.clock,
        ),
        connection_service,
        verification_token_service,
        gateway_secret: Arc::from(config.gateway_secret.as_str()),
    }
}
