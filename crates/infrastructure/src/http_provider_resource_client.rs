use async_trait::async_trait;

use tessera_application::{ProviderResource, ProviderResourceClient};
use tessera_core::{AppError, AppResult};
use tessera_domain::{Connection, Provider};


const SLACK_CONVERSATIONS_URL: &str = "https://slack.com/api/conversations.list";
const TRELLO_BOARDS_URL: &str = "https://api.trello.com/1/members/me/boards";
const ATLASSIAN_API_BASE: &str = "https://api.atlassian.com/ex";
const GRAPH_JOINED_TEAMS_URL: &str = "https://graph.microsoft.com/v1.0/me/joinedTeams";

/// reqwest-backed client listing top-level provider resources.
#[derive(Clone)]
pub struct HttpProviderResourceClient {
    http_client: reqwest::Client,
}

impl HttpProviderResourceClient {
    /// Creates a resource client that reuses the provided HTTP client.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    fn build_request(&self, connection: &Connection) -> reqwest::RequestBuilder {
        let credentials = &connection.credentials;
        let scope_value = credentials.scope_identifier.value();

        let request = match connection.provider {
            Provider::Slack => self
                .http_client
                .get(SLACK_CONVERSATIONS_URL)
                .query(&[("exclude_archived", "true"), ("limit", "200")])
                .bearer_auth(credentials.access_token.as_str()),
            // Trello pairs the API key with the user token as query parameters.
            Provider::Trello => self.http_client.get(TRELLO_BOARDS_URL).query(&[
                ("key", scope_value),
                ("token", credentials.access_token.as_str()),
                ("fields", "id,name"),
            ]),
            Provider::Jira => self
                .http_client
                .get(format!(
                    "{ATLASSIAN_API_BASE}/jira/{scope_value}/rest/api/3/project/search"
                ))
                .bearer_auth(credentials.access_token.as_str()),
            Provider::Confluence => self
                .http_client
                .get(format!(
                    "{ATLASSIAN_API_BASE}/confluence/{scope_value}/wiki/api/v2/spaces"
                ))
                .bearer_auth(credentials.access_token.as_str()),
            Provider::Teams => self
                .http_client
                .get(GRAPH_JOINED_TEAMS_URL)
                .bearer_auth(credentials.access_token.as_str()),
        };

        request.header(reqwest::header::ACCEPT, "application/json")
    }
}

#[async_trait]
impl ProviderResourceClient for HttpProviderResourceClient {
    async fn list_resources(&self, connection: &Connection) -> AppResult<Vec<ProviderResource>> {
        let provider = connection.provider;
        let response = self
            .build_request(connection)
            .send()
            .await
            .map_err(|error| AppError::Upstream(format!("{provider} request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            tracing::warn!(provider = %provider, %status, "provider API returned non-success");
            return Err(AppError::Upstream(format!(
                "{provider} API returned {status}: {body}"
            )));
        }

        let body = response.json::<serde_json::Value>().await.map_err(|error| {
            AppError::Upstream(format!("{provider} response was not JSON: {error}"))
        })?;

        parse_resources(provider, &body)
    }
}

fn parse_resources(provider: Provider, body: &serde_json::Value) -> AppResult<Vec<ProviderResource>> {
    let (items, kind) = match provider {
        Provider::Slack => {
            if body.get("ok").and_then(serde_json::Value::as_bool) != Some(true) {
                let error = body
                    .get("error")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("unknown_error");
                return Err(AppError::Upstream(format!("Slack API error: {error}")));
            }
            (body.get("channels"), "channel")
        }
        Provider::Trello => (Some(body), "board"),
        Provider::Jira => (body.get("values"), "project"),
        Provider::Confluence => (body.get("results"), "space"),
        Provider::Teams => (body.get("value"), "team"),
    };

    let items = items.and_then(serde_json::Value::as_array).ok_or_else(|| {
        AppError::Upstream(format!("{provider} response has no resource list"))
    })?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let id = item.get("id").and_then(serde_json::Value::as_str)?;
            let name = item
                .get("name")
                .or_else(|| item.get("displayName"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or(id);
            Some(ProviderResource {
                id: id.to_owned(),
                name: name.to_owned(),
                kind: kind.to_owned(),
            })
        })
        .collect())
}
