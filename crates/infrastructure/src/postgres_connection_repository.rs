//! PostgreSQL-backed connection repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tessera_application::{
    ConnectionQuery, ConnectionRepository, ReplacedConnection, ServiceScope,
};
use tessera_core::{AppError, AppResult};
use tessera_domain::{
    Connection, ConnectionCredentials, ConnectionId, CredentialRefresh, Provider,
    ScopeIdentifier, ScopeIdentifierKind,
};


const CONNECTION_COLUMNS: &str = "id, user_email, provider, access_token, refresh_token, \
     scope_identifier_kind, scope_identifier, scopes, expires_at, is_active, connected_at, \
     created_by, last_used_at";

/// PostgreSQL implementation of the connection repository port.
#[derive(Clone)]
pub struct PostgresConnectionRepository {
    pool: PgPool,
}

impl PostgresConnectionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionRepository for PostgresConnectionRepository {
    async fn replace_active_connection(
        &self,
        connection: Connection,
    ) -> AppResult<ReplacedConnection> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start connection transaction: {error}"))
        })?;

        // Serializes writers for one owner/provider; released at commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!(
                "connection:{}:{}",
                connection.user_email,
                connection.provider.as_str()
            ))
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to lock connection key: {error}"))
            })?;

        let replaced_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            DELETE FROM connections
            WHERE user_email = $1
              AND provider = $2
              AND is_active
            RETURNING id
            "#,
        )
        .bind(connection.user_email.as_str())
        .bind(connection.provider.as_str())
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to remove prior connection: {error}"))
        })?;

        let credentials = &connection.credentials;
        sqlx::query(
            r#"
            INSERT INTO connections (
                id, user_email, provider, access_token, refresh_token,
                scope_identifier_kind, scope_identifier, scopes, expires_at,
                is_active, connected_at, created_by, last_used_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(connection.id.as_uuid())
        .bind(connection.user_email.as_str())
        .bind(connection.provider.as_str())
        .bind(credentials.access_token.as_str())
        .bind(credentials.refresh_token.as_deref())
        .bind(credentials.scope_identifier.kind().field_name())
        .bind(credentials.scope_identifier.value())
        .bind(credentials.scopes.iter().cloned().collect::<Vec<_>>())
        .bind(credentials.expires_at)
        .bind(connection.is_active)
        .bind(connection.connected_at)
        .bind(connection.created_by.as_str())
        .bind(connection.last_used_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_write_error(error, "failed to insert connection"))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit connection transaction: {error}"))
        })?;

        Ok(ReplacedConnection {
            connection,
            replaced_ids: replaced_ids.into_iter().map(ConnectionId::from_uuid).collect(),
        })
    }

    async fn find_active_connection(
        &self,
        user_email: &str,
        provider: Provider,
    ) -> AppResult<Option<Connection>> {
        let row = sqlx::query_as::<_, ConnectionRow>(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM connections \
             WHERE user_email = $1 AND provider = $2 AND is_active"
        ))
        .bind(user_email)
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find connection: {error}")))?;

        row.map(ConnectionRow::into_connection).transpose()
    }

    async fn list_owned_connections(
        &self,
        user_email: &str,
        provider: Option<Provider>,
    ) -> AppResult<Vec<Connection>> {
        let rows = sqlx::query_as::<_, ConnectionRow>(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM connections \
             WHERE user_email = $1 AND ($2::TEXT IS NULL OR provider = $2) \
             ORDER BY connected_at DESC"
        ))
        .bind(user_email)
        .bind(provider.map(|provider| provider.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list connections: {error}")))?;

        rows.into_iter().map(ConnectionRow::into_connection).collect()
    }

    async fn delete_owned_connections(
        &self,
        user_email: &str,
        provider: Provider,
    ) -> AppResult<Vec<ConnectionId>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            DELETE FROM connections
            WHERE user_email = $1
              AND provider = $2
            RETURNING id
            "#,
        )
        .bind(user_email)
        .bind(provider.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete connections: {error}")))?;

        Ok(ids.into_iter().map(ConnectionId::from_uuid).collect())
    }

    async fn refresh_active_connection(
        &self,
        user_email: &str,
        provider: Provider,
        refresh: CredentialRefresh,
    ) -> AppResult<Option<Connection>> {
        let row = sqlx::query_as::<_, ConnectionRow>(&format!(
            "UPDATE connections \
             SET access_token = $3, refresh_token = COALESCE($4, refresh_token), expires_at = $5 \
             WHERE user_email = $1 AND provider = $2 AND is_active \
             RETURNING {CONNECTION_COLUMNS}"
        ))
        .bind(user_email)
        .bind(provider.as_str())
        .bind(refresh.access_token.as_str())
        .bind(refresh.refresh_token.as_deref())
        .bind(refresh.expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to refresh connection: {error}")))?;

        row.map(ConnectionRow::into_connection).transpose()
    }

    async fn record_connection_use(
        &self,
        connection_id: ConnectionId,
        used_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE connections SET last_used_at = $2 WHERE id = $1")
            .bind(connection_id.as_uuid())
            .bind(used_at)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to record connection use: {error}"))
            })?;

        Ok(())
    }

    async fn find_active_connection_for_actor(
        &self,
        scope: &ServiceScope,
        actor_email: &str,
        provider: Provider,
    ) -> AppResult<Option<Connection>> {
        tracing::debug!(reason = scope.reason(), provider = %provider, "service-scoped connection lookup");
        let row = sqlx::query_as::<_, ConnectionRow>(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM connections \
             WHERE provider = $2 AND is_active AND (user_email = $1 OR created_by = $1) \
             ORDER BY (user_email = $1) DESC, connected_at DESC \
             LIMIT 1"
        ))
        .bind(actor_email)
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find connection: {error}")))?;

        row.map(ConnectionRow::into_connection).transpose()
    }

    async fn deactivate_connection(
        &self,
        scope: &ServiceScope,
        connection_id: ConnectionId,
    ) -> AppResult<bool> {
        tracing::debug!(reason = scope.reason(), connection_id = %connection_id, "service-scoped deactivation");
        let result = sqlx::query(
            r#"
            UPDATE connections
            SET is_active = FALSE
            WHERE id = $1
              AND is_active
            "#,
        )
        .bind(connection_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to deactivate connection: {error}"))
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_all_connections(
        &self,
        scope: &ServiceScope,
        query: &ConnectionQuery,
    ) -> AppResult<Vec<Connection>> {
        tracing::debug!(reason = scope.reason(), "service-scoped connection listing");
        let limit = i64::try_from(query.limit)
            .map_err(|_| AppError::Validation("limit is too large".to_owned()))?;
        let offset = i64::try_from(query.offset)
            .map_err(|_| AppError::Validation("offset is too large".to_owned()))?;

        let rows = sqlx::query_as::<_, ConnectionRow>(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM connections \
             WHERE ($1::TEXT IS NULL OR user_email = $1) \
               AND ($2::TEXT IS NULL OR provider = $2) \
               AND (NOT $3 OR is_active) \
             ORDER BY connected_at DESC, id \
             LIMIT $4 OFFSET $5"
        ))
        .bind(query.user_email.as_deref())
        .bind(query.provider.map(|provider| provider.as_str()))
        .bind(query.active_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list connections: {error}")))?;

        rows.into_iter().map(ConnectionRow::into_connection).collect()
    }

    async fn delete_connections_for_provider(
        &self,
        scope: &ServiceScope,
        provider: Provider,
    ) -> AppResult<Vec<ConnectionId>> {
        tracing::debug!(reason = scope.reason(), provider = %provider, "service-scoped bulk delete");
        let ids = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM connections WHERE provider = $1 RETURNING id",
        )
        .bind(provider.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete connections: {error}")))?;

        Ok(ids.into_iter().map(ConnectionId::from_uuid).collect())
    }
}

fn map_write_error(error: sqlx::Error, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.is_unique_violation()
    {
        return AppError::Conflict(format!("{context}: an active connection already exists"));
    }

    AppError::Internal(format!("{context}: {error}"))
}

#[derive(Debug, sqlx::FromRow)]
struct ConnectionRow {
    id: Uuid,
    user_email: String,
    provider: String,
    access_token: String,
    refresh_token: Option<String>,
    scope_identifier_kind: String,
    scope_identifier: String,
    scopes: Vec<String>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    connected_at: DateTime<Utc>,
    created_by: String,
    last_used_at: Option<DateTime<Utc>>,
}

impl ConnectionRow {
    fn into_connection(self) -> AppResult<Connection> {
        let provider = self.provider.parse::<Provider>()?;
        let kind = ScopeIdentifierKind::parse(&self.scope_identifier_kind)?;

        Ok(Connection {
            id: ConnectionId::from_uuid(self.id),
            user_email: self.user_email,
            provider,
            credentials: ConnectionCredentials {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                scope_identifier: ScopeIdentifier::from_kind(kind, self.scope_identifier),
                scopes: self.scopes.into_iter().collect(),
                expires_at: self.expires_at,
            },
            is_active: self.is_active,
            connected_at: self.connected_at,
            created_by: self.created_by,
            last_used_at: self.last_used_at,
        })
    }
}
