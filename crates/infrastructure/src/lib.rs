//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_email_service;
mod http_oauth_token_exchanger;
mod http_provider_resource_client;
mod in_memory_connection_repository;
mod in_memory_membership_repository;
mod in_memory_oauth_state_repository;
mod in_memory_verification_token_repository;
mod postgres_connection_repository;
mod postgres_membership_repository;
mod postgres_oauth_state_repository;
mod postgres_verification_token_repository;
mod smtp_email_service;

pub use console_email_service::ConsoleEmailService;
pub use http_oauth_token_exchanger::HttpOAuthTokenExchanger;
pub use http_provider_resource_client::HttpProviderResourceClient;
pub use in_memory_connection_repository::InMemoryConnectionRepository;
pub use in_memory_membership_repository::InMemoryMembershipRepository;
pub use in_memory_oauth_state_repository::InMemoryOAuthStateRepository;
pub use in_memory_verification_token_repository::InMemoryVerificationTokenRepository;
pub use postgres_connection_repository::PostgresConnectionRepository;
pub use postgres_membership_repository::PostgresMembershipRepository;
pub use postgres_oauth_state_repository::PostgresOAuthStateRepository;
pub use postgres_verification_token_repository::PostgresVerificationTokenRepository;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
