use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tessera_core::{AppError, AppResult};
use tessera_domain::{Provider, ProviderDescriptor};

/// OAuth client registration for one provider.
#[derive(Clone)]
pub struct OAuthClientConfig {
    /// Public client identifier.
    pub client_id: String,
    /// Client secret used only for server-side token exchange.
    pub client_secret: Option<String>,
    /// Registered redirect URI.
    pub redirect_uri: String,
}

impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Registered OAuth clients keyed by provider.
#[derive(Debug, Clone, Default)]
pub struct OAuthClients {
    clients: HashMap<Provider, OAuthClientConfig>,
}

impl OAuthClients {
    /// Creates a registry from loaded client configurations.
    #[must_use]
    pub fn new(clients: HashMap<Provider, OAuthClientConfig>) -> Self {
        Self { clients }
    }

    /// Returns the client for `provider` or a configuration error.
    pub fn get(&self, provider: Provider) -> AppResult<&OAuthClientConfig> {
        self.clients.get(&provider).ok_or_else(|| {
            AppError::Configuration(format!("no OAuth client configured for {provider}"))
        })
    }

    /// Providers with a registered client.
    #[must_use]
    pub fn configured_providers(&self) -> Vec<Provider> {
        let mut providers = self.clients.keys().copied().collect::<Vec<_>>();
        providers.sort();
        providers
    }
}

/// Pending authorization request, keyed by the hash of its state nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthStateRecord {
    /// SHA-256 hash of the state value sent to the provider.
    pub state_hash: String,
    /// Provider the consent was started for.
    pub provider: Provider,
    /// Owner the resulting connection belongs to.
    pub owner_email: String,
    /// When the authorization began.
    pub created_at: DateTime<Utc>,
    /// When the state stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Repository port for single-use OAuth state.
#[async_trait]
pub trait OAuthStateRepository: Send + Sync {
    /// Persists a pending authorization.
    async fn save_state(&self, record: OAuthStateRecord) -> AppResult<()>;

    /// Removes and returns the record for `state_hash` in one step.
    async fn consume_state(&self, state_hash: &str) -> AppResult<Option<OAuthStateRecord>>;
}

/// Tokens returned by a provider token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Access token.
    pub access_token: String,
    /// Refresh token, when issued.
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    pub expires_in: Option<i64>,
    /// Scopes the provider reports as granted.
    pub scopes: Vec<String>,
    /// Provider scoping identifier resolved during the exchange.
    pub scope_identifier: Option<String>,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_in", &self.expires_in)
            .field("scopes", &self.scopes)
            .field("scope_identifier", &self.scope_identifier)
            .finish()
    }
}

/// Port for talking to provider token endpoints.
#[async_trait]
pub trait OAuthTokenExchanger: Send + Sync {
    /// Exchanges an authorization code for tokens.
    async fn exchange_code(
        &self,
        descriptor: &'static ProviderDescriptor,
        client: &OAuthClientConfig,
        code: &str,
    ) -> AppResult<TokenGrant>;

    /// Redeems a refresh token.
    async fn refresh_token(
        &self,
        descriptor: &'static ProviderDescriptor,
        client: &OAuthClientConfig,
        refresh_token: &str,
    ) -> AppResult<TokenGrant>;
}
