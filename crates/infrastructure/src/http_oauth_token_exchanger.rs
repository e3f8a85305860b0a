use async_trait::async_trait;
use serde::Deserialize;

use tessera_application::{OAuthClientConfig, OAuthTokenExchanger, TokenGrant};
use tessera_core::{AppError, AppResult};
use tessera_domain::{ProviderDescriptor, ScopeIdentifierKind};


const ATLASSIAN_ACCESSIBLE_RESOURCES_URL: &str =
    "https://api.atlassian.com/oauth/token/accessible-resources";
const GRAPH_ORGANIZATION_URL: &str = "https://graph.microsoft.com/v1.0/organization?$select=id";

/// reqwest-backed client for provider token endpoints.
#[derive(Clone)]
pub struct HttpOAuthTokenExchanger {
    http_client: reqwest::Client,
}

impl HttpOAuthTokenExchanger {
    /// Creates an exchanger that reuses the provided HTTP client.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    async fn post_token_form(
        &self,
        descriptor: &'static ProviderDescriptor,
        client: &OAuthClientConfig,
        form: &[(&str, &str)],
    ) -> AppResult<serde_json::Value> {
        let endpoint = descriptor.token_endpoint.ok_or_else(|| {
            AppError::Validation(format!(
                "{} does not support server-side token exchange",
                descriptor.display_name
            ))
        })?;

        let mut fields = vec![("client_id", client.client_id.as_str())];
        if let Some(secret) = client.client_secret.as_deref() {
            fields.push(("client_secret", secret));
        }
        fields.extend_from_slice(form);

        let response = self
            .http_client
            .post(endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&fields)
            .send()
            .await
            .map_err(|error| {
                AppError::Upstream(format!(
                    "{} token endpoint unreachable: {error}",
                    descriptor.display_name
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            return Err(AppError::Upstream(format!(
                "{} token endpoint returned {status}: {body}",
                descriptor.display_name
            )));
        }

        response.json::<serde_json::Value>().await.map_err(|error| {
            AppError::Upstream(format!(
                "{} token response was not JSON: {error}",
                descriptor.display_name
            ))
        })
    }

    async fn resolve_scope_identifier(
        &self,
        descriptor: &'static ProviderDescriptor,
        access_token: &str,
    ) -> AppResult<Option<String>> {
        let url = match descriptor.scope_identifier {
            ScopeIdentifierKind::CloudId => ATLASSIAN_ACCESSIBLE_RESOURCES_URL,
            ScopeIdentifierKind::TenantId => GRAPH_ORGANIZATION_URL,
            ScopeIdentifierKind::TeamId | ScopeIdentifierKind::ApiKey => return Ok(None),
        };

        let response = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| {
                AppError::Upstream(format!(
                    "{} identity lookup failed: {error}",
                    descriptor.display_name
                ))
            })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "{} identity lookup returned {}",
                descriptor.display_name,
                response.status()
            )));
        }

        let body = response.json::<serde_json::Value>().await.map_err(|error| {
            AppError::Upstream(format!(
                "{} identity response was not JSON: {error}",
                descriptor.display_name
            ))
        })?;

        Ok(match descriptor.scope_identifier {
            ScopeIdentifierKind::CloudId => first_accessible_resource_id(&body),
            _ => first_organization_id(&body),
        })
    }
}

#[async_trait]
impl OAuthTokenExchanger for HttpOAuthTokenExchanger {
    async fn exchange_code(
        &self,
        descriptor: &'static ProviderDescriptor,
        client: &OAuthClientConfig,
        code: &str,
    ) -> AppResult<TokenGrant> {
        let body = self
            .post_token_form(
                descriptor,
                client,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", client.redirect_uri.as_str()),
                ],
            )
            .await?;

        let mut grant = parse_token_response(descriptor, body)?;
        if grant.scope_identifier.is_none() {
            grant.scope_identifier = self
                .resolve_scope_identifier(descriptor, &grant.access_token)
                .await?;
        }

        tracing::info!(
            provider = %descriptor.provider,
            has_refresh_token = grant.refresh_token.is_some(),
            "exchanged authorization code"
        );
        Ok(grant)
    }

    async fn refresh_token(
        &self,
        descriptor: &'static ProviderDescriptor,
        client: &OAuthClientConfig,
        refresh_token: &str,
    ) -> AppResult<TokenGrant> {
        let body = self
            .post_token_form(
                descriptor,
                client,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                ],
            )
            .await?;

        parse_token_response(descriptor, body)
    }
}

#[derive(Debug, Deserialize)]
struct StandardTokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlackTokenResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    team: Option<SlackTeam>,
}

#[derive(Debug, Deserialize)]
struct SlackTeam {
    id: String,
}

fn parse_token_response(
    descriptor: &ProviderDescriptor,
    body: serde_json::Value,
) -> AppResult<TokenGrant> {
    if descriptor.scope_identifier == ScopeIdentifierKind::TeamId {
        return parse_slack_response(body);
    }

    let response: StandardTokenResponse = serde_json::from_value(body).map_err(|error| {
        AppError::Upstream(format!(
            "{} token response is malformed: {error}",
            descriptor.display_name
        ))
    })?;

    Ok(TokenGrant {
        access_token: response.access_token,
        refresh_token: response.refresh_token,
        expires_in: response.expires_in,
        scopes: split_scopes(response.scope.as_deref(), ' '),
        scope_identifier: None,
    })
}

// Slack reports failures with HTTP 200 and `ok: false`.
fn parse_slack_response(body: serde_json::Value) -> AppResult<TokenGrant> {
    let response: SlackTokenResponse = serde_json::from_value(body).map_err(|error| {
        AppError::Upstream(format!("Slack token response is malformed: {error}"))
    })?;

    if !response.ok {
        return Err(AppError::Upstream(format!(
            "Slack rejected the token request: {}",
            response.error.as_deref().unwrap_or("unknown_error")
        )));
    }

    let access_token = response
        .access_token
        .ok_or_else(|| AppError::Upstream("Slack response has no access_token".to_owned()))?;

    Ok(TokenGrant {
        access_token,
        refresh_token: response.refresh_token,
        expires_in: response.expires_in,
        scopes: split_scopes(response.scope.as_deref(), ','),
        scope_identifier: response.team.map(|team| team.id),
    })
}

fn split_scopes(scope: Option<&str>, separator: char) -> Vec<String> {
    scope
        .unwrap_or_default()
        .split(separator)
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(str::to_owned)
        .collect()
}

fn first_accessible_resource_id(body: &serde_json::Value) -> Option<String> {
    body.as_array()?
        .first()?
        .get("id")?
        .as_str()
        .map(str::to_owned)
}

fn first_organization_id(body: &serde_json::Value) -> Option<String> {
    body.get("value")?
        .as_array()?
        .first()?
        .get("id")?
        .as_str()
        .map(str::to_owned)
}
