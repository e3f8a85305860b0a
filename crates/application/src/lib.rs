//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_gate;
mod clock;
mod connection_ports;
mod connection_service;
mod email_ports;
mod membership_service;
mod oauth_ports;
mod oauth_service;
mod provider_proxy_service;
#[cfg(test)]
mod test_support;
mod token_crypto;
mod token_delivery_service;
mod verification_ports;
mod verification_token_service;

pub use authorization_gate::{AuthorizationGate, ServiceScope};
pub use clock::{Clock, SystemClock};
pub use connection_ports::{ConnectionQuery, ConnectionRepository, ReplacedConnection};
pub use connection_service::{BulkDeleteResult, ConnectionService, DisconnectOutcome};
pub use email_ports::{EmailService, OutboundEmail};
pub use membership_service::{MembershipRepository, MembershipService};
pub use oauth_ports::{
    OAuthClientConfig, OAuthClients, OAuthStateRecord, OAuthStateRepository,
    OAuthTokenExchanger, TokenGrant,
};
pub use oauth_service::{
    AuthorizationRedirect, AuthorizationState, OAUTH_STATE_VALIDITY_MINUTES, OAuthCallbackParams,
    OAuthService, build_authorization_url,
};
pub use provider_proxy_service::{ProviderProxyService, ProviderResource, ProviderResourceClient};
pub use token_delivery_service::TokenDeliveryService;
pub use verification_ports::{NewVerificationToken, VerificationTokenRepository};
pub use verification_token_service::{IssuedToken, VerificationTokenService};
