//! PostgreSQL-backed single-use OAuth state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tessera_application::{OAuthStateRecord, OAuthStateRepository};
use tessera_core::{AppError, AppResult};

/// PostgreSQL implementation of the OAuth state repository port.
#[derive(Clone)]
pub struct PostgresOAuthStateRepository {
    pool: PgPool,
}

impl PostgresOAuthStateRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OAuthStateRepository for PostgresOAuthStateRepository {
    async fn save_state(&self, record: OAuthStateRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO oauth_states (state_hash, provider, owner_email, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.state_hash.as_str())
        .bind(record.provider.as_str())
        .bind(record.owner_email.as_str())
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save oauth state: {error}")))?;

        Ok(())
    }

    async fn consume_state(&self, state_hash: &str) -> AppResult<Option<OAuthStateRecord>> {
        let row = sqlx::query_as::<_, StateRow>(
            r#"
            DELETE FROM oauth_states
            WHERE state_hash = $1
            RETURNING state_hash, provider, owner_email, created_at, expires_at
            "#,
        )
        .bind(state_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to consume oauth state: {error}")))?;

        row.map(|row| {
            Ok(OAuthStateRecord {
                provider: row.provider.parse()?,
                state_hash: row.state_hash,
                owner_email: row.owner_email,
                created_at: row.created_at,
                expires_at: row.expires_at,
            })
        })
        .transpose()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StateRow {
    state_hash: String,
    provider: String,
    owner_email: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}
