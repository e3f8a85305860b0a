//! Connection registry: per-user provider credentials.
//!
//! Each `(owner, provider)` pair holds at most one active connection. Saving
//! replaces the prior active record atomically through the repository.

use std::sync::Arc;

use tessera_core::{AppError, AppResult, Principal};
use tessera_domain::{Capability, Connection, ConnectionId, CredentialRefresh, Provider};

use crate::{AuthorizationGate, Clock, ConnectionRepository};

mod admin;
mod disconnect;
mod save;


/// What a disconnect did to the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The caller's records were deleted.
    Deleted(Vec<ConnectionId>),
    /// The record was soft-revoked and retained.
    Deactivated(ConnectionId),
}

/// Result of an administrative bulk delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeleteResult {
    /// Provider whose connections were removed.
    pub provider: Provider,
    /// Removed record identifiers.
    pub deleted_ids: Vec<ConnectionId>,
}

impl BulkDeleteResult {
    /// Number of removed records.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.deleted_ids.len()
    }
}

/// Application service for connection lifecycle operations.
#[derive(Clone)]
pub struct ConnectionService {
    repository: Arc<dyn ConnectionRepository>,
    clock: Arc<dyn Clock>,
}

impl ConnectionService {
    /// Creates a new connection service.
    #[must_use]
    pub fn new(repository: Arc<dyn ConnectionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Lists the actor's own connections.
    pub async fn list_connections(
        &self,
        actor: &Principal,
        provider: Option<Provider>,
    ) -> AppResult<Vec<Connection>> {
        AuthorizationGate::authorize(actor, Capability::ConnectionManageOwn)?;
        self.repository
            .list_owned_connections(actor.email(), provider)
            .await
    }

    /// Returns the actor's active connection for a provider.
    pub async fn find_active_connection(
        &self,
        actor: &Principal,
        provider: Provider,
    ) -> AppResult<Connection> {
        AuthorizationGate::authorize(actor, Capability::ConnectionManageOwn)?;
        self.repository
            .find_active_connection(actor.email(), provider)
            .await?
            .ok_or_else(|| no_active_connection(provider))
    }

    /// Stores refreshed tokens on the actor's active connection.
    pub async fn apply_refresh(
        &self,
        actor: &Principal,
        provider: Provider,
        refresh: CredentialRefresh,
    ) -> AppResult<Connection> {
        AuthorizationGate::authorize(actor, Capability::ConnectionManageOwn)?;
        self.repository
            .refresh_active_connection(actor.email(), provider, refresh)
            .await?
            .ok_or_else(|| no_active_connection(provider))
    }

    /// Marks a connection as used. Failures are logged and swallowed.
    pub async fn record_use(&self, connection: &Connection) {
        let used_at = self.clock.now();
        if let Err(error) = self
            .repository
            .record_connection_use(connection.id, used_at)
            .await
        {
            tracing::warn!(
                connection_id = %connection.id,
                provider = %connection.provider,
                error = %error,
                "failed to record connection use"
            );
        }
    }
}

fn no_active_connection(provider: Provider) -> AppError {
    AppError::NotFound(format!("no active {provider} connection"))
}
