//! Per-user external provider connections.
//!
//! At most one connection per `(user_email, provider)` is active at a time.
//! `expires_at` is advisory: nothing in the registry expires a connection,
//! the provider proxy consults it before using the token.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_core::{AppError, AppResult};
use uuid::Uuid;

use crate::{EmailAddress, Provider, ScopeIdentifierKind};

/// Store-assigned identifier of a connection record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random connection identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a connection identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Provider-specific identifier scoping a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ScopeIdentifier {
    /// Atlassian cloud site id.
    CloudId(String),
    /// Azure AD tenant id.
    TenantId(String),
    /// Slack team id.
    TeamId(String),
    /// Trello API key.
    ApiKey(String),
}

impl ScopeIdentifier {
    /// Builds an identifier of the given kind.
    #[must_use]
    pub fn from_kind(kind: ScopeIdentifierKind, value: impl Into<String>) -> Self {
        let value = value.into();
        match kind {
            ScopeIdentifierKind::CloudId => Self::CloudId(value),
            ScopeIdentifierKind::TenantId => Self::TenantId(value),
            ScopeIdentifierKind::TeamId => Self::TeamId(value),
            ScopeIdentifierKind::ApiKey => Self::ApiKey(value),
        }
    }

    /// Returns the identifier kind.
    #[must_use]
    pub fn kind(&self) -> ScopeIdentifierKind {
        match self {
            Self::CloudId(_) => ScopeIdentifierKind::CloudId,
            Self::TenantId(_) => ScopeIdentifierKind::TenantId,
            Self::TeamId(_) => ScopeIdentifierKind::TeamId,
            Self::ApiKey(_) => ScopeIdentifierKind::ApiKey,
        }
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::CloudId(value)
            | Self::TenantId(value)
            | Self::TeamId(value)
            | Self::ApiKey(value) => value.as_str(),
        }
    }
}

/// Unvalidated credential input as submitted by a caller or a token exchange.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialFields {
    /// Primary credential (OAuth access token or provider user token).
    pub access_token: Option<String>,
    /// Optional refresh token.
    pub refresh_token: Option<String>,
    /// Atlassian cloud id.
    pub cloud_id: Option<String>,
    /// Azure AD tenant id.
    pub tenant_id: Option<String>,
    /// Slack team id.
    pub team_id: Option<String>,
    /// Trello API key.
    pub api_key: Option<String>,
    /// Granted scopes; provider defaults apply when empty.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Advisory access token expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CredentialFields {
    fn scope_value(&self, kind: ScopeIdentifierKind) -> Option<&str> {
        let value = match kind {
            ScopeIdentifierKind::CloudId => self.cloud_id.as_deref(),
            ScopeIdentifierKind::TenantId => self.tenant_id.as_deref(),
            ScopeIdentifierKind::TeamId => self.team_id.as_deref(),
            ScopeIdentifierKind::ApiKey => self.api_key.as_deref(),
        };

        value.map(str::trim).filter(|value| !value.is_empty())
    }
}

/// Validated credential set for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionCredentials {
    /// Primary credential.
    pub access_token: String,
    /// Optional refresh token.
    pub refresh_token: Option<String>,
    /// Identifier scoping the credential.
    pub scope_identifier: ScopeIdentifier,
    /// Granted scopes.
    pub scopes: BTreeSet<String>,
    /// Advisory access token expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl ConnectionCredentials {
    /// Validates raw fields against the provider's requirements.
    ///
    /// A primary credential and the provider's scoping identifier are
    /// mandatory; everything else is optional.
    pub fn from_fields(provider: Provider, fields: CredentialFields) -> AppResult<Self> {
        let descriptor = provider.descriptor();

        let access_token = fields
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "access_token is required for {} connections",
                    provider.as_str()
                ))
            })?
            .to_owned();

        let scope_kind = descriptor.scope_identifier;
        let scope_value = fields.scope_value(scope_kind).ok_or_else(|| {
            AppError::Validation(format!(
                "{} is required for {} connections",
                scope_kind.field_name(),
                provider.as_str()
            ))
        })?;
        let scope_identifier = ScopeIdentifier::from_kind(scope_kind, scope_value);

        let mut scopes: BTreeSet<String> = fields
            .scopes
            .iter()
            .map(|scope| scope.trim())
            .filter(|scope| !scope.is_empty())
            .map(str::to_owned)
            .collect();
        if scopes.is_empty() {
            scopes = descriptor.default_scope_list().into_iter().collect();
        }

        let refresh_token = fields
            .refresh_token
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        Ok(Self {
            access_token,
            refresh_token,
            scope_identifier,
            scopes,
            expires_at: fields.expires_at,
        })
    }
}

/// Replacement tokens obtained from a refresh grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRefresh {
    /// New access token.
    pub access_token: String,
    /// Rotated refresh token, if the provider issued one.
    pub refresh_token: Option<String>,
    /// New advisory expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Stored credential linking one user to one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Store-assigned identifier.
    pub id: ConnectionId,
    /// Owner key.
    pub user_email: String,
    /// Connected provider.
    pub provider: Provider,
    /// Secrets and scoping.
    pub credentials: ConnectionCredentials,
    /// Whether this record is the active connection for its owner/provider.
    pub is_active: bool,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    /// Email of the principal that created the record.
    pub created_by: String,
    /// Last time the provider proxy used the credential.
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Connection {
    /// Creates a new active connection.
    #[must_use]
    pub fn connect(
        owner: &EmailAddress,
        created_by: &EmailAddress,
        provider: Provider,
        credentials: ConnectionCredentials,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            user_email: owner.as_str().to_owned(),
            provider,
            credentials,
            is_active: true,
            connected_at: now,
            created_by: created_by.as_str().to_owned(),
            last_used_at: None,
        }
    }

    /// Returns whether the advisory token expiry has passed.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.credentials
            .expires_at
            .is_some_and(|expires_at| expires_at <= now)
    }

    /// Returns whether `email` owns or created this connection.
    #[must_use]
    pub fn is_owned_or_created_by(&self, email: &str) -> bool {
        self.user_email == email || self.created_by == email
    }

    /// Applies refreshed tokens, keeping the old refresh token when none is rotated in.
    pub fn apply_refresh(&mut self, refresh: CredentialRefresh) {
        self.credentials.access_token = refresh.access_token;
        if refresh.refresh_token.is_some() {
            self.credentials.refresh_token = refresh.refresh_token;
        }
        self.credentials.expires_at = refresh.expires_at;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{
        Connection, ConnectionCredentials, CredentialFields, CredentialRefresh, ScopeIdentifier,
    };
    use crate::{EmailAddress, Provider};

    fn slack_fields(token: &str) -> CredentialFields {
        CredentialFields {
            access_token: Some(token.to_owned()),
            team_id: Some("T1".to_owned()),
            ..CredentialFields::default()
        }
    }

    #[test]
    fn missing_access_token_is_rejected() {
        let fields = CredentialFields {
            team_id: Some("T1".to_owned()),
            ..CredentialFields::default()
        };
        assert!(ConnectionCredentials::from_fields(Provider::Slack, fields).is_err());
    }

    #[test]
    fn missing_scope_identifier_is_rejected() {
        let fields = CredentialFields {
            access_token: Some("t1".to_owned()),
            cloud_id: Some("wrong-kind".to_owned()),
            ..CredentialFields::default()
        };
        assert!(ConnectionCredentials::from_fields(Provider::Slack, fields).is_err());
    }

    #[test]
    fn trello_requires_api_key_pair() {
        let without_key = CredentialFields {
            access_token: Some("user-token".to_owned()),
            ..CredentialFields::default()
        };
        assert!(ConnectionCredentials::from_fields(Provider::Trello, without_key).is_err());

        let with_key = CredentialFields {
            access_token: Some("user-token".to_owned()),
            api_key: Some("key-1".to_owned()),
            ..CredentialFields::default()
        };
        let credentials = ConnectionCredentials::from_fields(Provider::Trello, with_key);
        assert_eq!(
            credentials.ok().map(|value| value.scope_identifier),
            Some(ScopeIdentifier::ApiKey("key-1".to_owned()))
        );
    }

    #[test]
    fn empty_scopes_fall_back_to_provider_defaults() {
        let credentials = ConnectionCredentials::from_fields(Provider::Slack, slack_fields("t1"))
            .unwrap_or_else(|error| panic!("valid fields rejected: {error}"));
        assert!(credentials.scopes.contains("channels:read"));
    }

    #[test]
    fn advisory_expiry_and_refresh() {
        let owner = EmailAddress::new("bob@example.com")
            .unwrap_or_else(|error| panic!("invalid email: {error}"));
        let now = Utc::now();
        let mut fields = slack_fields("t1");
        fields.refresh_token = Some("r1".to_owned());
        fields.expires_at = Some(now - Duration::minutes(1));
        let credentials = ConnectionCredentials::from_fields(Provider::Slack, fields)
            .unwrap_or_else(|error| panic!("valid fields rejected: {error}"));

        let mut connection = Connection::connect(&owner, &owner, Provider::Slack, credentials, now);
        assert!(connection.is_active);
        assert!(connection.is_expired_at(now));

        connection.apply_refresh(CredentialRefresh {
            access_token: "t2".to_owned(),
            refresh_token: None,
            expires_at: Some(now + Duration::hours(1)),
        });
        assert!(!connection.is_expired_at(now));
        assert_eq!(connection.credentials.access_token, "t2");
        assert_eq!(connection.credentials.refresh_token.as_deref(), Some("r1"));
    }
}
