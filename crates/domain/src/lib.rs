//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod connection;
mod email;
mod membership;
mod provider;
mod security;
mod verification;

pub use connection::{
    Connection, ConnectionCredentials, ConnectionId, CredentialFields, CredentialRefresh,
    ScopeIdentifier,
};
pub use email::EmailAddress;
pub use membership::WorkspaceMembership;
pub use provider::{
    DisconnectPolicy, Provider, ProviderDescriptor, ResponseType, ScopeIdentifierKind,
};
pub use security::Capability;
pub use verification::{
    MAX_VALIDITY_WINDOW_DAYS, PASSWORD_RESET_VALIDITY_MINUTES, TokenKind, TokenPayload,
    TokenStatus, VerificationToken, validity_window, window_from_days, window_from_hours,
};
