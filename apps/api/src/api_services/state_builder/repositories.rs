use std::sync::Arc;

use sqlx::PgPool;
use tessera_application::{
    ConnectionRepository, MembershipRepository, OAuthStateRepository, VerificationTokenRepository,
};
use tessera_infrastructure::{
    InMemoryConnectionRepository, InMemoryMembershipRepository, InMemoryOAuthStateRepository,
    InMemoryVerificationTokenRepository, PostgresConnectionRepository,
    PostgresMembershipRepository, PostgresOAuthStateRepository,
    PostgresVerificationTokenRepository,
};

/// Persistence adapters selected by `STORE_BACKEND`.
pub struct StorePorts {
    pub connection_repository: Arc<dyn ConnectionRepository>,
    pub token_repository: Arc<dyn VerificationTokenRepository>,
    pub oauth_state_repository: Arc<dyn OAuthStateRepository>,
    pub membership_repository: Arc<dyn MembershipRepository>,
}

impl StorePorts {
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            connection_repository: Arc::new(PostgresConnectionRepository::new(pool.clone())),
            token_repository: Arc::new(PostgresVerificationTokenRepository::new(pool.clone())),
            oauth_state_repository: Arc::new(PostgresOAuthStateRepository::new(pool.clone())),
            membership_repository: Arc::new(PostgresMembershipRepository::new(pool.clone())),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            connection_repository: Arc::new(InMemoryConnectionRepository::new()),
            token_repository: Arc::new(InMemoryVerificationTokenRepository::new()),
            oauth_state_repository: Arc::new(InMemoryOAuthStateRepository::new()),
            membership_repository: Arc::new(InMemoryMembershipRepository::new()),
        }
    }
}
