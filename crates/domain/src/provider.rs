//! Third-party providers and their OAuth/credential quirks.
//!
//! Every provider-specific difference (endpoints, scopes, implicit vs. code
//! flow, scoping identifier, disconnect semantics) is captured in one static
//! [`ProviderDescriptor`] so services never branch on the provider name.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera_core::AppError;

/// External platform a user can connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Atlassian Jira issue tracker.
    Jira,
    /// Atlassian Confluence wiki.
    Confluence,
    /// Slack chat workspace.
    Slack,
    /// Microsoft Teams.
    Teams,
    /// Trello boards.
    Trello,
}

impl Provider {
    /// Returns the stable storage value for this provider.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jira => "jira",
            Self::Confluence => "confluence",
            Self::Slack => "slack",
            Self::Teams => "teams",
            Self::Trello => "trello",
        }
    }

    /// Returns all known providers.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Provider] = &[
            Provider::Jira,
            Provider::Confluence,
            Provider::Slack,
            Provider::Teams,
            Provider::Trello,
        ];

        ALL
    }

    /// Returns the static descriptor for this provider.
    #[must_use]
    pub fn descriptor(&self) -> &'static ProviderDescriptor {
        match self {
            Self::Jira => &JIRA,
            Self::Confluence => &CONFLUENCE,
            Self::Slack => &SLACK,
            Self::Teams => &TEAMS,
            Self::Trello => &TRELLO,
        }
    }
}

impl FromStr for Provider {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "jira" => Ok(Self::Jira),
            "confluence" => Ok(Self::Confluence),
            "slack" => Ok(Self::Slack),
            "teams" => Ok(Self::Teams),
            "trello" => Ok(Self::Trello),
            _ => Err(AppError::Validation(format!("unknown provider '{value}'"))),
        }
    }
}

impl Display for Provider {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// OAuth response type requested at the authorize endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Authorization code flow; the code is exchanged server-side.
    Code,
    /// Implicit flow; the provider hands the token straight to the browser.
    Token,
}

impl ResponseType {
    /// Returns the query parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Token => "token",
        }
    }
}

/// Which identifier scopes a provider credential to a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeIdentifierKind {
    /// Atlassian cloud site id.
    CloudId,
    /// Azure AD tenant id.
    TenantId,
    /// Slack team id.
    TeamId,
    /// API key paired with a user token.
    ApiKey,
}

impl ScopeIdentifierKind {
    /// Returns the credential field carrying this identifier.
    #[must_use]
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::CloudId => "cloud_id",
            Self::TenantId => "tenant_id",
            Self::TeamId => "team_id",
            Self::ApiKey => "api_key",
        }
    }

    /// Parses a storage value.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "cloud_id" => Ok(Self::CloudId),
            "tenant_id" => Ok(Self::TenantId),
            "team_id" => Ok(Self::TeamId),
            "api_key" => Ok(Self::ApiKey),
            _ => Err(AppError::Validation(format!(
                "unknown scope identifier kind '{value}'"
            ))),
        }
    }
}

/// What a disconnect does to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectPolicy {
    /// The caller's own records are deleted.
    Delete,
    /// An elevated operator flips `is_active` off and the record is retained.
    Deactivate,
}

/// Static capability set describing one provider.
#[derive(Debug)]
pub struct ProviderDescriptor {
    /// Provider the descriptor belongs to.
    pub provider: Provider,
    /// Human-readable name used in logs and emails.
    pub display_name: &'static str,
    /// OAuth authorize endpoint.
    pub authorize_endpoint: &'static str,
    /// OAuth token endpoint, absent for implicit-only providers.
    pub token_endpoint: Option<&'static str>,
    /// Scopes requested when the caller does not override them.
    pub default_scopes: &'static [&'static str],
    /// Requested response type.
    pub response_type: ResponseType,
    /// Query parameter carrying the client id.
    pub client_id_param: &'static str,
    /// Query parameter carrying the redirect URI.
    pub redirect_uri_param: &'static str,
    /// Provider-specific flags appended to the authorize URL.
    pub extra_authorize_params: &'static [(&'static str, &'static str)],
    /// Identifier that scopes the credential.
    pub scope_identifier: ScopeIdentifierKind,
    /// Disconnect semantics.
    pub disconnect_policy: DisconnectPolicy,
    /// Whether consent may begin before the user has a host session.
    pub public_start: bool,
}

impl ProviderDescriptor {
    /// Returns the default scopes as owned strings.
    #[must_use]
    pub fn default_scope_list(&self) -> Vec<String> {
        self.default_scopes
            .iter()
            .map(|scope| (*scope).to_owned())
            .collect()
    }
}

static JIRA: ProviderDescriptor = ProviderDescriptor {
    provider: Provider::Jira,
    display_name: "Jira",
    authorize_endpoint: "https://auth.atlassian.com/authorize",
    token_endpoint: Some("https://auth.atlassian.com/oauth/token"),
    default_scopes: &["read:jira-work", "read:jira-user", "offline_access"],
    response_type: ResponseType::Code,
    client_id_param: "client_id",
    redirect_uri_param: "redirect_uri",
    extra_authorize_params: &[("audience", "api.atlassian.com"), ("prompt", "consent")],
    scope_identifier: ScopeIdentifierKind::CloudId,
    disconnect_policy: DisconnectPolicy::Deactivate,
    public_start: false,
};

static CONFLUENCE: ProviderDescriptor = ProviderDescriptor {
    provider: Provider::Confluence,
    display_name: "Confluence",
    authorize_endpoint: "https://auth.atlassian.com/authorize",
    token_endpoint: Some("https://auth.atlassian.com/oauth/token"),
    default_scopes: &[
        "read:confluence-space.summary",
        "read:confluence-content.all",
        "offline_access",
    ],
    response_type: ResponseType::Code,
    client_id_param: "client_id",
    redirect_uri_param: "redirect_uri",
    extra_authorize_params: &[("audience", "api.atlassian.com"), ("prompt", "consent")],
    scope_identifier: ScopeIdentifierKind::CloudId,
    disconnect_policy: DisconnectPolicy::Delete,
    public_start: false,
};

static SLACK: ProviderDescriptor = ProviderDescriptor {
    provider: Provider::Slack,
    display_name: "Slack",
    authorize_endpoint: "https://slack.com/oauth/v2/authorize",
    token_endpoint: Some("https://slack.com/api/oauth.v2.access"),
    default_scopes: &["channels:read", "channels:history", "users:read"],
    response_type: ResponseType::Code,
    client_id_param: "client_id",
    redirect_uri_param: "redirect_uri",
    extra_authorize_params: &[],
    scope_identifier: ScopeIdentifierKind::TeamId,
    disconnect_policy: DisconnectPolicy::Delete,
    public_start: true,
};

static TEAMS: ProviderDescriptor = ProviderDescriptor {
    provider: Provider::Teams,
    display_name: "Microsoft Teams",
    authorize_endpoint: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
    token_endpoint: Some("https://login.microsoftonline.com/common/oauth2/v2.0/token"),
    default_scopes: &[
        "offline_access",
        "User.Read",
        "Team.ReadBasic.All",
        "Channel.ReadBasic.All",
    ],
    response_type: ResponseType::Code,
    client_id_param: "client_id",
    redirect_uri_param: "redirect_uri",
    extra_authorize_params: &[("response_mode", "query"), ("prompt", "consent")],
    scope_identifier: ScopeIdentifierKind::TenantId,
    disconnect_policy: DisconnectPolicy::Delete,
    public_start: true,
};

static TRELLO: ProviderDescriptor = ProviderDescriptor {
    provider: Provider::Trello,
    display_name: "Trello",
    authorize_endpoint: "https://trello.com/1/authorize",
    token_endpoint: None,
    default_scopes: &["read"],
    response_type: ResponseType::Token,
    client_id_param: "key",
    redirect_uri_param: "return_url",
    extra_authorize_params: &[
        ("expiration", "never"),
        ("name", "Tessera"),
        ("callback_method", "fragment"),
    ],
    scope_identifier: ScopeIdentifierKind::ApiKey,
    disconnect_policy: DisconnectPolicy::Delete,
    public_start: false,
};
