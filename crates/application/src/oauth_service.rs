//! OAuth consent flows: authorization URLs, callbacks and refresh.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use tessera_core::{AppError, AppResult, Principal};
use tessera_domain::{EmailAddress, Provider};

use crate::{Clock, ConnectionService, OAuthClients, OAuthStateRepository, OAuthTokenExchanger};

mod authorization_url;
mod callback;
mod refresh;
mod start;


pub use authorization_url::build_authorization_url;

/// How long a persisted state nonce is accepted.
pub const OAUTH_STATE_VALIDITY_MINUTES: i64 = 10;

/// Value carried in the OAuth `state` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationState {
    /// Random single-use CSRF nonce, persisted server-side.
    Nonce(String),
    /// Caller-supplied correlation identifier. Provides no CSRF protection.
    Correlation(String),
}

impl AuthorizationState {
    /// Returns the raw parameter value.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Nonce(value) | Self::Correlation(value) => value.as_str(),
        }
    }
}

/// Where to send the browser to start consent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRedirect {
    /// Provider being connected.
    pub provider: Provider,
    /// Absolute authorize URL.
    pub url: String,
    /// When the persisted state stops being accepted, if one was persisted.
    pub state_expires_at: Option<DateTime<Utc>>,
}

/// Query parameters delivered to the OAuth callback.
#[derive(Debug, Clone, Default)]
pub struct OAuthCallbackParams {
    /// Authorization code.
    pub code: Option<String>,
    /// State echoed by the provider.
    pub state: Option<String>,
    /// Provider error code, when consent failed.
    pub error: Option<String>,
    /// Human-readable provider error.
    pub error_description: Option<String>,
}

/// Application service for OAuth consent flows.
#[derive(Clone)]
pub struct OAuthService {
    clients: Arc<OAuthClients>,
    state_repository: Arc<dyn OAuthStateRepository>,
    exchanger: Arc<dyn OAuthTokenExchanger>,
    connections: ConnectionService,
    clock: Arc<dyn Clock>,
}

impl OAuthService {
    /// Creates a new OAuth service.
    #[must_use]
    pub fn new(
        clients: Arc<OAuthClients>,
        state_repository: Arc<dyn OAuthStateRepository>,
        exchanger: Arc<dyn OAuthTokenExchanger>,
        connections: ConnectionService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            clients,
            state_repository,
            exchanger,
            connections,
            clock,
        }
    }

    /// Providers with a configured OAuth client.
    #[must_use]
    pub fn configured_providers(&self) -> Vec<Provider> {
        self.clients.configured_providers()
    }
}

fn require_param<'a>(value: Option<&'a str>, name: &str) -> AppResult<&'a str> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Validation(format!("missing OAuth callback parameter '{name}'")))
}

fn principal_owner(actor: &Principal) -> AppResult<EmailAddress> {
    EmailAddress::new(actor.email())
}

/// Turns a provider-reported token lifetime into an absolute expiry.
fn grant_expiry(
    provider: Provider,
    now: DateTime<Utc>,
    expires_in: Option<i64>,
) -> AppResult<Option<DateTime<Utc>>> {
    let Some(seconds) = expires_in else {
        return Ok(None);
    };
    if seconds < 0 {
        return Err(AppError::Upstream(format!(
            "{provider} reported a negative token lifetime"
        )));
    }

    Duration::try_seconds(seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .map(Some)
        .ok_or_else(|| {
            AppError::Upstream(format!(
                "{provider} reported an out-of-range token lifetime of {seconds} seconds"
            ))
        })
}
