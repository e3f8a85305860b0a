use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tessera_core::AppResult;
use tessera_domain::{Connection, ConnectionId, CredentialRefresh, Provider};

use crate::ServiceScope;

/// Filters for the elevated connection listing.
#[derive(Debug, Clone)]
pub struct ConnectionQuery {
    /// Restrict to one owner.
    pub user_email: Option<String>,
    /// Restrict to one provider.
    pub provider: Option<Provider>,
    /// Skip soft-revoked records.
    pub active_only: bool,
    /// Page size.
    pub limit: usize,
    /// Page offset.
    pub offset: usize,
}

impl Default for ConnectionQuery {
    fn default() -> Self {
        Self {
            user_email: None,
            provider: None,
            active_only: false,
            limit: 100,
            offset: 0,
        }
    }
}

/// Result of an atomic active-connection replacement.
#[derive(Debug, Clone)]
pub struct ReplacedConnection {
    /// The newly stored active connection.
    pub connection: Connection,
    /// Identifiers of previously active records that were removed.
    pub replaced_ids: Vec<ConnectionId>,
}

/// Repository port for connection persistence.
///
/// Methods without a [`ServiceScope`] are keyed by the owner email and never
/// return another user's records.
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Removes the owner's active record for the provider and inserts
    /// `connection` as one atomic step.
    async fn replace_active_connection(
        &self,
        connection: Connection,
    ) -> AppResult<ReplacedConnection>;

    /// Finds the owner's active connection for a provider.
    async fn find_active_connection(
        &self,
        user_email: &str,
        provider: Provider,
    ) -> AppResult<Option<Connection>>;

    /// Lists the owner's connections, newest first.
    async fn list_owned_connections(
        &self,
        user_email: &str,
        provider: Option<Provider>,
    ) -> AppResult<Vec<Connection>>;

    /// Deletes every record the owner holds for a provider.
    async fn delete_owned_connections(
        &self,
        user_email: &str,
        provider: Provider,
    ) -> AppResult<Vec<ConnectionId>>;

    /// Swaps tokens on the owner's active connection.
    async fn refresh_active_connection(
        &self,
        user_email: &str,
        provider: Provider,
        refresh: CredentialRefresh,
    ) -> AppResult<Option<Connection>>;

    /// Records that the credential was used.
    async fn record_connection_use(
        &self,
        connection_id: ConnectionId,
        used_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Finds an active connection the actor owns or created.
    async fn find_active_connection_for_actor(
        &self,
        scope: &ServiceScope,
        actor_email: &str,
        provider: Provider,
    ) -> AppResult<Option<Connection>>;

    /// Flips an active record to inactive. Returns `false` when it was not active.
    async fn deactivate_connection(
        &self,
        scope: &ServiceScope,
        connection_id: ConnectionId,
    ) -> AppResult<bool>;

    /// Lists connections across all owners.
    async fn list_all_connections(
        &self,
        scope: &ServiceScope,
        query: &ConnectionQuery,
    ) -> AppResult<Vec<Connection>>;

    /// Deletes every record of a provider across all owners.
    async fn delete_connections_for_provider(
        &self,
        scope: &ServiceScope,
        provider: Provider,
    ) -> AppResult<Vec<ConnectionId>>;
}
