use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use tessera_application::{
    ConnectionQuery, ConnectionRepository, ReplacedConnection, ServiceScope,
};
use tessera_core::{AppError, AppResult};
use tessera_domain::{Connection, ConnectionId, CredentialRefresh, Provider};


/// In-memory connection repository implementation.
///
/// Every mutation runs under one write lock, which gives the same atomicity
/// as the conditional statements of the PostgreSQL adapter.
#[derive(Debug, Default)]
pub struct InMemoryConnectionRepository {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl InMemoryConnectionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut connections: Vec<Connection>) -> Vec<Connection> {
    connections.sort_by(|left, right| {
        right
            .connected_at
            .cmp(&left.connected_at)
            .then_with(|| left.id.as_uuid().cmp(&right.id.as_uuid()))
    });
    connections
}

fn is_active_for(connection: &Connection, user_email: &str, provider: Provider) -> bool {
    connection.is_active && connection.user_email == user_email && connection.provider == provider
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn replace_active_connection(
        &self,
        connection: Connection,
    ) -> AppResult<ReplacedConnection> {
        let mut connections = self.connections.write().await;
        if connections.contains_key(&connection.id) {
            return Err(AppError::Conflict(format!(
                "connection '{}' already exists",
                connection.id
            )));
        }

        let replaced_ids = connections
            .values()
            .filter(|existing| {
                is_active_for(existing, &connection.user_email, connection.provider)
            })
            .map(|existing| existing.id)
            .collect::<Vec<_>>();
        for id in &replaced_ids {
            connections.remove(id);
        }
        connections.insert(connection.id, connection.clone());

        Ok(ReplacedConnection {
            connection,
            replaced_ids,
        })
    }

    async fn find_active_connection(
        &self,
        user_email: &str,
        provider: Provider,
    ) -> AppResult<Option<Connection>> {
        let connections = self.connections.read().await;
        Ok(connections
            .values()
            .find(|connection| is_active_for(connection, user_email, provider))
            .cloned())
    }

    async fn list_owned_connections(
        &self,
        user_email: &str,
        provider: Option<Provider>,
    ) -> AppResult<Vec<Connection>> {
        let connections = self.connections.read().await;
        Ok(newest_first(
            connections
                .values()
                .filter(|connection| connection.user_email == user_email)
                .filter(|connection| {
                    provider.is_none_or(|provider| connection.provider == provider)
                })
                .cloned()
                .collect(),
        ))
    }

    async fn delete_owned_connections(
        &self,
        user_email: &str,
        provider: Provider,
    ) -> AppResult<Vec<ConnectionId>> {
        let mut connections = self.connections.write().await;
        let ids = connections
            .values()
            .filter(|connection| {
                connection.user_email == user_email && connection.provider == provider
            })
            .map(|connection| connection.id)
            .collect::<Vec<_>>();
        for id in &ids {
            connections.remove(id);
        }

        Ok(ids)
    }

    async fn refresh_active_connection(
        &self,
        user_email: &str,
        provider: Provider,
        refresh: CredentialRefresh,
    ) -> AppResult<Option<Connection>> {
        let mut connections = self.connections.write().await;
        let Some(connection) = connections
            .values_mut()
            .find(|connection| is_active_for(connection, user_email, provider))
        else {
            return Ok(None);
        };

        connection.apply_refresh(refresh);
        Ok(Some(connection.clone()))
    }

    async fn record_connection_use(
        &self,
        connection_id: ConnectionId,
        used_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&connection_id) {
            connection.last_used_at = Some(used_at);
        }

        Ok(())
    }

    async fn find_active_connection_for_actor(
        &self,
        scope: &ServiceScope,
        actor_email: &str,
        provider: Provider,
    ) -> AppResult<Option<Connection>> {
        tracing::debug!(reason = scope.reason(), provider = %provider, "service-scoped connection lookup");
        let connections = self.connections.read().await;
        let mut candidates = connections
            .values()
            .filter(|connection| {
                connection.is_active
                    && connection.provider == provider
                    && connection.is_owned_or_created_by(actor_email)
            })
            .cloned()
            .collect::<Vec<_>>();
        // Prefer the actor's own record over one it created for someone else.
        candidates.sort_by_key(|connection| connection.user_email != actor_email);

        Ok(candidates.into_iter().next())
    }

    async fn deactivate_connection(
        &self,
        scope: &ServiceScope,
        connection_id: ConnectionId,
    ) -> AppResult<bool> {
        tracing::debug!(reason = scope.reason(), connection_id = %connection_id, "service-scoped deactivation");
        let mut connections = self.connections.write().await;
        match connections.get_mut(&connection_id) {
            Some(connection) if connection.is_active => {
                connection.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_all_connections(
        &self,
        scope: &ServiceScope,
        query: &ConnectionQuery,
    ) -> AppResult<Vec<Connection>> {
        tracing::debug!(reason = scope.reason(), "service-scoped connection listing");
        let connections = self.connections.read().await;
        let matching = connections
            .values()
            .filter(|connection| {
                query
                    .user_email
                    .as_deref()
                    .is_none_or(|email| connection.user_email == email)
            })
            .filter(|connection| {
                query
                    .provider
                    .is_none_or(|provider| connection.provider == provider)
            })
            .filter(|connection| !query.active_only || connection.is_active)
            .cloned()
            .collect();

        Ok(newest_first(matching)
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn delete_connections_for_provider(
        &self,
        scope: &ServiceScope,
        provider: Provider,
    ) -> AppResult<Vec<ConnectionId>> {
        tracing::debug!(reason = scope.reason(), provider = %provider, "service-scoped bulk delete");
        let mut connections = self.connections.write().await;
        let ids = connections
            .values()
            .filter(|connection| connection.provider == provider)
            .map(|connection| connection.id)
            .collect::<Vec<_>>();
        for id in &ids {
            connections.remove(id);
        }

        Ok(ids)
    }
}
