use std::sync::Arc;

use tessera_application::{
    ConnectionService, MembershipService, OAuthService, ProviderProxyService,
    TokenDeliveryService, VerificationTokenService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub connection_service: ConnectionService,
    pub oauth_service: OAuthService,
    pub provider_proxy_service: ProviderProxyService,
    pub verification_token_service: VerificationTokenService,
    pub token_delivery_service: TokenDeliveryService,
    pub membership_service: MembershipService,
    pub gateway_secret: Arc<str>,
}
