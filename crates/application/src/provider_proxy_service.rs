//! Thin pass-through to provider APIs using a stored connection.

use std::sync::Arc;

use async_trait::async_trait;

use tessera_core::{AppError, AppResult, Principal};
use tessera_domain::{Connection, Provider};

use crate::{Clock, ConnectionService};


/// One top-level resource visible through a connection
/// (channel, board, project, space, team).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResource {
    /// Provider-side identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Resource kind, such as `channel` or `board`.
    pub kind: String,
}

/// Port for provider API calls made with a stored credential.
#[async_trait]
pub trait ProviderResourceClient: Send + Sync {
    /// Lists the resources the credential can see.
    async fn list_resources(&self, connection: &Connection) -> AppResult<Vec<ProviderResource>>;
}

/// Application service proxying provider reads.
#[derive(Clone)]
pub struct ProviderProxyService {
    connections: ConnectionService,
    client: Arc<dyn ProviderResourceClient>,
    clock: Arc<dyn Clock>,
}

impl ProviderProxyService {
    /// Creates a new proxy service.
    #[must_use]
    pub fn new(
        connections: ConnectionService,
        client: Arc<dyn ProviderResourceClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connections,
            client,
            clock,
        }
    }

    /// Lists provider resources through the actor's active connection.
    ///
    /// Fails with `Expired` when the advisory token expiry has passed; the
    /// caller is expected to refresh or reconnect.
    pub async fn list_resources(
        &self,
        actor: &Principal,
        provider: Provider,
    ) -> AppResult<Vec<ProviderResource>> {
        let connection = self.connections.find_active_connection(actor, provider).await?;
        if connection.is_expired_at(self.clock.now()) {
            return Err(AppError::Expired(format!(
                "{provider} access token has expired"
            )));
        }

        let resources = self.client.list_resources(&connection).await?;
        self.connections.record_use(&connection).await;

        tracing::debug!(owner = %actor.email(), provider = %provider, count = resources.len(), "provider resources listed");
        Ok(resources)
    }
}
