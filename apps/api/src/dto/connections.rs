use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_application::{
    BulkDeleteResult, DisconnectOutcome, OAuthCallbackParams, ProviderResource,
};
use tessera_core::Role;
use tessera_domain::{Connection, ScopeIdentifierKind, WorkspaceMembership};

/// API representation of a stored connection. Secrets never leave the server.
#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub id: String,
    pub provider: String,
    pub user_email: String,
    pub scope_identifier_kind: &'static str,
    /// Omitted for API-key scoped providers.
    pub scope_identifier: Option<String>,
    pub scopes: Vec<String>,
    pub has_refresh_token: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub connected_at: DateTime<Utc>,
    pub created_by: String,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<Connection> for ConnectionResponse {
    fn from(value: Connection) -> Self {
        let credentials = value.credentials;
        let kind = credentials.scope_identifier.kind();
        let scope_identifier = (kind != ScopeIdentifierKind::ApiKey)
            .then(|| credentials.scope_identifier.value().to_owned());

        Self {
            id: value.id.to_string(),
            provider: value.provider.as_str().to_owned(),
            user_email: value.user_email,
            scope_identifier_kind: kind.field_name(),
            scope_identifier,
            scopes: credentials.scopes.into_iter().collect(),
            has_refresh_token: credentials.refresh_token.is_some(),
            expires_at: credentials.expires_at,
            is_active: value.is_active,
            connected_at: value.connected_at,
            created_by: value.created_by,
            last_used_at: value.last_used_at,
        }
    }
}

/// Result of a disconnect.
#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub provider: String,
    pub outcome: &'static str,
    pub connection_ids: Vec<String>,
}

impl DisconnectResponse {
    #[must_use]
    pub fn new(provider: &str, outcome: DisconnectOutcome) -> Self {
        let (label, ids) = match outcome {
            DisconnectOutcome::Deleted(ids) => ("deleted", ids),
            DisconnectOutcome::Deactivated(id) => ("deactivated", vec![id]),
        };

        Self {
            provider: provider.to_owned(),
            outcome: label,
            connection_ids: ids.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Admin listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct AdminConnectionsQuery {
    pub user_email: Option<String>,
    pub provider: Option<String>,
    pub active_only: Option<bool>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Result of a provider-wide bulk delete.
#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub provider: String,
    pub deleted_count: usize,
    pub deleted_ids: Vec<String>,
}

impl From<BulkDeleteResult> for BulkDeleteResponse {
    fn from(value: BulkDeleteResult) -> Self {
        Self {
            provider: value.provider.as_str().to_owned(),
            deleted_count: value.deleted_count(),
            deleted_ids: value.deleted_ids.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Optional scope override for an authenticated consent start.
#[derive(Debug, Default, Deserialize)]
pub struct OAuthStartQuery {
    /// Space or comma separated scopes.
    pub scopes: Option<String>,
}

impl OAuthStartQuery {
    #[must_use]
    pub fn scope_list(&self) -> Vec<String> {
        self.scopes
            .as_deref()
            .unwrap_or_default()
            .split([' ', ','])
            .filter(|scope| !scope.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Correlation id carried through a public consent start.
#[derive(Debug, Deserialize)]
pub struct PublicOAuthStartQuery {
    pub correlation_id: String,
}

/// Query parameters a provider appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl From<OAuthCallbackQuery> for OAuthCallbackParams {
    fn from(value: OAuthCallbackQuery) -> Self {
        Self {
            code: value.code,
            state: value.state,
            error: value.error,
            error_description: value.error_description,
        }
    }
}

/// One provider resource.
#[derive(Debug, Serialize)]
pub struct ProviderResourceResponse {
    pub id: String,
    pub name: String,
    pub kind: String,
}

impl From<ProviderResource> for ProviderResourceResponse {
    fn from(value: ProviderResource) -> Self {
        Self {
            id: value.id,
            name: value.name,
            kind: value.kind,
        }
    }
}

/// Incoming payload for a workspace role change.
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRoleRequest {
    pub role: Role,
}

/// API representation of a workspace membership.
#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub workspace_id: String,
    pub email: String,
    pub role: Role,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkspaceMembership> for MembershipResponse {
    fn from(value: WorkspaceMembership) -> Self {
        Self {
            workspace_id: value.workspace_id,
            email: value.email,
            role: value.role,
            updated_at: value.updated_at,
        }
    }
}
