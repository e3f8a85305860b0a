use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tessera_core::{AppError, AppResult};
use tessera_domain::{
    Connection, ConnectionId, CredentialRefresh, Provider, TokenKind, TokenStatus,
    VerificationToken,
};
use uuid::Uuid;

use crate::{
    Clock, ConnectionQuery, ConnectionRepository, NewVerificationToken, ReplacedConnection,
    ServiceScope, VerificationTokenRepository,
};

pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|_| Utc::now())
    }
}

fn lock_error<T>(error: std::sync::PoisonError<T>) -> AppError {
    AppError::Internal(format!("failed to lock repo state: {error}"))
}

#[derive(Default)]
pub(crate) struct FakeConnectionRepository {
    pub(crate) connections: Mutex<Vec<Connection>>,
    pub(crate) fail_record_use: bool,
    pub(crate) elevated_reasons: Mutex<Vec<&'static str>>,
}

impl FakeConnectionRepository {
    pub(crate) fn snapshot(&self) -> Vec<Connection> {
        self.connections
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn note_scope(&self, scope: &ServiceScope) -> AppResult<()> {
        self.elevated_reasons
            .lock()
            .map_err(lock_error)?
            .push(scope.reason());
        Ok(())
    }
}

#[async_trait]
impl ConnectionRepository for FakeConnectionRepository {
    async fn replace_active_connection(
        &self,
        connection: Connection,
    ) -> AppResult<ReplacedConnection> {
        let mut connections = self.connections.lock().map_err(lock_error)?;
        let replaced_ids = connections
            .iter()
            .filter(|existing| {
                existing.is_active
                    && existing.user_email == connection.user_email
                    && existing.provider == connection.provider
            })
            .map(|existing| existing.id)
            .collect::<Vec<_>>();
        connections.retain(|existing| !replaced_ids.contains(&existing.id));
        connections.push(connection.clone());

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
        Ok(self
            .connections
            .lock()
            .map_err(lock_error)?
            .iter()
            .find(|connection| {
                connection.is_active
                    && connection.user_email == user_email
                    && connection.provider == provider
            })
            .cloned())
    }

    async fn list_owned_connections(
        &self,
        user_email: &str,
        provider: Option<Provider>,
    ) -> AppResult<Vec<Connection>> {
        Ok(self
            .connections
            .lock()
            .map_err(lock_error)?
            .iter()
            .filter(|connection| connection.user_email == user_email)
            .filter(|connection| provider.is_none_or(|provider| connection.provider == provider))
            .cloned()
            .collect())
    }

    async fn delete_owned_connections(
        &self,
        user_email: &str,
        provider: Provider,
    ) -> AppResult<Vec<ConnectionId>> {
        let mut connections = self.connections.lock().map_err(lock_error)?;
        let deleted = connections
            .iter()
            .filter(|connection| {
                connection.user_email == user_email && connection.provider == provider
            })
            .map(|connection| connection.id)
            .collect::<Vec<_>>();
        connections.retain(|connection| !deleted.contains(&connection.id));
        Ok(deleted)
    }

    async fn refresh_active_connection(
        &self,
        user_email: &str,
        provider: Provider,
        refresh: CredentialRefresh,
    ) -> AppResult<Option<Connection>> {
        let mut connections = self.connections.lock().map_err(lock_error)?;
        let Some(connection) = connections.iter_mut().find(|connection| {
            connection.is_active
                && connection.user_email == user_email
                && connection.provider == provider
        }) else {
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
        if self.fail_record_use {
            return Err(AppError::Internal("store unavailable".to_owned()));
        }

        let mut connections = self.connections.lock().map_err(lock_error)?;
        if let Some(connection) = connections
            .iter_mut()
            .find(|connection| connection.id == connection_id)
        {
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
        self.note_scope(scope)?;
        Ok(self
            .connections
            .lock()
            .map_err(lock_error)?
            .iter()
            .find(|connection| {
                connection.is_active
                    && connection.provider == provider
                    && connection.is_owned_or_created_by(actor_email)
            })
            .cloned())
    }

    async fn deactivate_connection(
        &self,
        scope: &ServiceScope,
        connection_id: ConnectionId,
    ) -> AppResult<bool> {
        self.note_scope(scope)?;
        let mut connections = self.connections.lock().map_err(lock_error)?;
        match connections
            .iter_mut()
            .find(|connection| connection.id == connection_id && connection.is_active)
        {
            Some(connection) => {
                connection.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_all_connections(
        &self,
        scope: &ServiceScope,
        query: &ConnectionQuery,
    ) -> AppResult<Vec<Connection>> {
        self.note_scope(scope)?;
        Ok(self
            .connections
            .lock()
            .map_err(lock_error)?
            .iter()
            .filter(|connection| {
                query
                    .user_email
                    .as_deref()
                    .is_none_or(|email| connection.user_email == email)
                    && query
                        .provider
                        .is_none_or(|provider| connection.provider == provider)
                    && (!query.active_only || connection.is_active)
            })
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn delete_connections_for_provider(
        &self,
        scope: &ServiceScope,
        provider: Provider,
    ) -> AppResult<Vec<ConnectionId>> {
        self.note_scope(scope)?;
        let mut connections = self.connections.lock().map_err(lock_error)?;
        let deleted = connections
            .iter()
            .filter(|connection| connection.provider == provider)
            .map(|connection| connection.id)
            .collect::<Vec<_>>();
        connections.retain(|connection| connection.provider != provider);
        Ok(deleted)
    }
}

#[derive(Default)]
pub(crate) struct FakeTokenRepository {
    tokens: Mutex<Vec<VerificationToken>>,
}

impl FakeTokenRepository {
    pub(crate) fn status_of(&self, id: Uuid) -> Option<TokenStatus> {
        self.tokens.lock().ok().and_then(|tokens| {
            tokens
                .iter()
                .find(|token| token.id == id)
                .map(|token| token.status)
        })
    }

    pub(crate) fn count(&self) -> usize {
        self.tokens.lock().map(|tokens| tokens.len()).unwrap_or(0)
    }
}

#[async_trait]
impl VerificationTokenRepository for FakeTokenRepository {
    async fn create_token(&self, token: NewVerificationToken) -> AppResult<VerificationToken> {
        let stored = VerificationToken {
            id: Uuid::new_v4(),
            kind: token.payload.kind(),
            token_hash: token.token_hash,
            email: token.email,
            payload: token.payload,
            status: TokenStatus::Pending,
            expires_at: token.expires_at,
            created_at: token.created_at,
            resolved_at: None,
        };
        self.tokens.lock().map_err(lock_error)?.push(stored.clone());
        Ok(stored)
    }

    async fn find_token(
        &self,
        kind: TokenKind,
        token_hash: &str,
    ) -> AppResult<Option<VerificationToken>> {
        Ok(self
            .tokens
            .lock()
            .map_err(lock_error)?
            .iter()
            .find(|token| token.kind == kind && token.token_hash == token_hash)
            .cloned())
    }

    async fn resolve_pending_token(
        &self,
        kind: TokenKind,
        token_hash: &str,
        to: TokenStatus,
        now: DateTime<Utc>,
    ) -> AppResult<Option<VerificationToken>> {
        let mut tokens = self.tokens.lock().map_err(lock_error)?;
        let Some(token) = tokens.iter_mut().find(|token| {
            token.kind == kind
                && token.token_hash == token_hash
                && token.status == TokenStatus::Pending
                && token.expires_at > now
        }) else {
            return Ok(None);
        };
        token.status = to;
        token.resolved_at = Some(now);
        Ok(Some(token.clone()))
    }

    async fn expire_pending_token(
        &self,
        kind: TokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<VerificationToken>> {
        let mut tokens = self.tokens.lock().map_err(lock_error)?;
        let Some(token) = tokens.iter_mut().find(|token| {
            token.kind == kind
                && token.token_hash == token_hash
                && token.status == TokenStatus::Pending
                && token.expires_at <= now
        }) else {
            return Ok(None);
        };
        token.status = TokenStatus::Expired;
        token.resolved_at = Some(now);
        Ok(Some(token.clone()))
    }
}
