use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::{Value, json};
use tessera_application::{
    EmailService, OAuthClientConfig, OAuthTokenExchanger, OutboundEmail, ProviderResource,
    ProviderResourceClient, SystemClock, TokenGrant,
};
use tessera_core::{AppError, AppResult};
use tessera_domain::{Connection, Provider, ProviderDescriptor};
use tower::ServiceExt;

use super::build_router;
use crate::api_config::{ApiConfig, EmailProviderConfig, StoreBackend};
use crate::api_services::{ServiceAdapters, StorePorts, assemble_app_state};
use crate::middleware::{GATEWAY_SECRET_HEADER, PRINCIPAL_EMAIL_HEADER, PRINCIPAL_ROLE_HEADER};

const SECRET: &str = "test-gateway-secret-0123456789abcdef";
const FRONTEND_URL: &str = "http://localhost:3000";

#[derive(Default)]
struct RecordingEmailService {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingEmailService {
    fn last_token(&self) -> String {
        let sent = self
            .sent
            .lock()
            .unwrap_or_else(|error| panic!("email lock poisoned: {error}"));
        let body = sent
            .last()
            .map(|email| email.text_body.clone())
            .unwrap_or_else(|| panic!("no email was sent"));
        body.split("token=")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .map(str::to_owned)
            .unwrap_or_else(|| panic!("email carries no token link: {body}"))
    }

    fn count(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(|error| panic!("email lock poisoned: {error}"))
            .len()
    }
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send_email(&self, email: &OutboundEmail) -> AppResult<()> {
        self.sent
            .lock()
            .map_err(|error| AppError::Internal(format!("email lock poisoned: {error}")))?
            .push(email.clone());
        Ok(())
    }
}

struct StubExchanger;

#[async_trait]
impl OAuthTokenExchanger for StubExchanger {
    async fn exchange_code(
        &self,
        descriptor: &'static ProviderDescriptor,
        _client: &OAuthClientConfig,
        code: &str,
    ) -> AppResult<TokenGrant> {
        if code == "bad-code" {
            return Err(AppError::Upstream(format!(
                "{} rejected the code",
                descriptor.display_name
            )));
        }

        Ok(TokenGrant {
            access_token: format!("access-{code}"),
            refresh_token: Some("refresh-1".to_owned()),
            expires_in: Some(3600),
            scopes: vec!["channels:read".to_owned()],
            scope_identifier: Some("T-team".to_owned()),
        })
    }

    async fn refresh_token(
        &self,
        _descriptor: &'static ProviderDescriptor,
        _client: &OAuthClientConfig,
        _refresh_token: &str,
    ) -> AppResult<TokenGrant> {
        Ok(TokenGrant {
            access_token: "access-refreshed".to_owned(),
            refresh_token: None,
            expires_in: Some(3600),
            scopes: Vec::new(),
            scope_identifier: None,
        })
    }
}

struct StubResourceClient;

#[async_trait]
impl ProviderResourceClient for StubResourceClient {
    async fn list_resources(&self, connection: &Connection) -> AppResult<Vec<ProviderResource>> {
        Ok(vec![ProviderResource {
            id: "b1".to_owned(),
            name: format!("{} board", connection.provider),
            kind: "board".to_owned(),
        }])
    }
}

struct TestApp {
    router: Router,
    emails: Arc<RecordingEmailService>,
}

fn client(provider: &str) -> OAuthClientConfig {
    OAuthClientConfig {
        client_id: format!("{provider}-client"),
        client_secret: Some("secret".to_owned()),
        redirect_uri: format!("https://app.example.com/oauth/{provider}/callback"),
    }
}

fn test_app() -> TestApp {
    let oauth_clients = HashMap::from([
        (Provider::Slack, client("slack")),
        (Provider::Teams, client("teams")),
        (Provider::Jira, client("jira")),
    ]);
    let config = ApiConfig {
        migrate_only: false,
        store_backend: StoreBackend::Memory,
        frontend_url: FRONTEND_URL.to_owned(),
        gateway_secret: SECRET.to_owned(),
        api_host: "127.0.0.1".to_owned(),
        api_port: 0,
        email_provider: EmailProviderConfig::Console,
        email_from_name: "Tessera".to_owned(),
        oauth_clients: oauth_clients.clone(),
    };

    let emails = Arc::new(RecordingEmailService::default());
    let state = assemble_app_state(
        StorePorts::in_memory(),
        ServiceAdapters {
            email_service: emails.clone(),
            token_exchanger: Arc::new(StubExchanger),
            resource_client: Arc::new(StubResourceClient),
            clock: Arc::new(SystemClock),
        },
        oauth_clients,
        &config,
    );
    let router = build_router(state, FRONTEND_URL)
        .unwrap_or_else(|error| panic!("router should build: {error}"));

    TestApp { router, emails }
}

fn request(method: &str, uri: &str, principal: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((email, role)) = principal {
        builder = builder
            .header(GATEWAY_SECRET_HEADER, SECRET)
            .header(PRINCIPAL_EMAIL_HEADER, email)
            .header(PRINCIPAL_ROLE_HEADER, role);
    }

    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    builder
        .body(body)
        .unwrap_or_else(|error| panic!("request should build: {error}"))
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|error| panic!("router call failed: {error}"));
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|error| panic!("body read failed: {error}"));
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|error| panic!("body is not JSON: {error}"))
    };

    (status, headers, body)
}

const ALICE: Option<(&str, &str)> = Some(("alice@example.com", "member"));
const ADMIN: Option<(&str, &str)> = Some(("admin@example.com", "admin"));

fn query_param(location: &str, name: &str) -> Option<String> {
    let url = url::Url::parse(location).unwrap_or_else(|error| panic!("bad location: {error}"));
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn location(headers: &HeaderMap) -> String {
    headers
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| panic!("redirect has no location"))
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app();
    let (status, _, body) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_reject_anonymous_and_untrusted_callers() {
    let app = test_app();
    let (status, _, body) = send(&app, request("GET", "/api/connections", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");

    let forged = Request::builder()
        .method("GET")
        .uri("/api/connections")
        .header(GATEWAY_SECRET_HEADER, "guess")
        .header(PRINCIPAL_EMAIL_HEADER, "admin@example.com")
        .header(PRINCIPAL_ROLE_HEADER, "admin")
        .body(Body::empty())
        .unwrap_or_else(|error| panic!("request should build: {error}"));
    let (status, _, _) = send(&app, forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn saved_connection_is_listed_without_secrets() {
    let app = test_app();
    let (status, _, saved) = send(
        &app,
        request(
            "POST",
            "/api/connections/trello",
            ALICE,
            Some(json!({ "access_token": "trello-user-token", "api_key": "trello-key" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["provider"], "trello");
    assert_eq!(saved["scope_identifier_kind"], "api_key");
    assert_eq!(saved["scope_identifier"], Value::Null);

    let (status, _, listed) = send(&app, request("GET", "/api/connections", ALICE, None)).await;
    assert_eq!(status, StatusCode::OK);
    let rendered = listed.to_string();
    assert!(!rendered.contains("trello-user-token"));
    assert!(!rendered.contains("trello-key"));
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (_, _, others) = send(
        &app,
        request("GET", "/api/connections", Some(("bob@example.com", "member")), None),
    )
    .await;
    assert_eq!(others.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn missing_scope_identifier_and_unknown_provider_are_validation_errors() {
    let app = test_app();
    let (status, _, body) = send(
        &app,
        request(
            "POST",
            "/api/connections/slack",
            ALICE,
            Some(json!({ "access_token": "xoxb" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, _, _) = send(&app, request("GET", "/api/connections/github/resources", ALICE, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_resources_flow_through_the_active_connection() {
    let app = test_app();
    let (status, _, _) = send(&app, request("GET", "/api/connections/trello/resources", ALICE, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(
        &app,
        request(
            "POST",
            "/api/connections/trello",
            ALICE,
            Some(json!({ "access_token": "t", "api_key": "k" })),
        ),
    )
    .await;
    let (status, _, resources) =
        send(&app, request("GET", "/api/connections/trello/resources", ALICE, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resources[0]["kind"], "board");

    let (_, _, listed) = send(&app, request("GET", "/api/connections", ALICE, None)).await;
    assert!(!listed[0]["last_used_at"].is_null());
}

#[tokio::test]
async fn oauth_code_flow_is_bound_to_a_single_use_state() {
    let app = test_app();
    let (status, headers, _) = send(
        &app,
        request("GET", "/api/connections/jira/oauth/start?scopes=read:jira-work", ALICE, None),
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);
    let location = location(&headers);
    assert!(location.starts_with("https://auth.atlassian.com/authorize?"));
    assert_eq!(query_param(&location, "audience").as_deref(), Some("api.atlassian.com"));
    let state = query_param(&location, "state").unwrap_or_else(|| panic!("state missing"));
    assert_eq!(state.len(), 64);

    let callback = format!("/api/connections/jira/oauth/callback?code=abc&state={state}");
    let (status, _, connection) = send(&app, request("GET", &callback, ALICE, None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(connection["scope_identifier"], "T-team");
    assert_eq!(connection["has_refresh_token"], true);

    let (status, _, replay) = send(&app, request("GET", &callback, ALICE, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(replay["code"], "validation_error");
}

#[tokio::test]
async fn oauth_callback_from_another_user_is_forbidden() {
    let app = test_app();
    let (_, headers, _) = send(&app, request("GET", "/api/connections/jira/oauth/start", ALICE, None)).await;
    let state = query_param(&location(&headers), "state").unwrap_or_else(|| panic!("state missing"));

    let callback = format!("/api/connections/jira/oauth/callback?code=abc&state={state}");
    let (status, _, _) = send(
        &app,
        request("GET", &callback, Some(("mallory@example.com", "member")), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn provider_errors_map_to_client_and_gateway_statuses() {
    let app = test_app();
    let (status, _, _) = send(
        &app,
        request(
            "GET",
            "/api/connections/slack/oauth/callback?error=access_denied",
            ALICE,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, headers, _) = send(&app, request("GET", "/api/connections/slack/oauth/start", ALICE, None)).await;
    let state = query_param(&location(&headers), "state").unwrap_or_else(|| panic!("state missing"));
    let (status, _, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/connections/slack/oauth/callback?code=bad-code&state={state}"),
            ALICE,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "upstream_error");
}

#[tokio::test]
async fn unconfigured_provider_is_a_generic_server_error() {
    let app = test_app();
    let (status, _, body) = send(
        &app,
        request("GET", "/api/connections/confluence/oauth/start", ALICE, None),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "configuration_error");
    assert_eq!(body["message"], "internal server error");
}

#[tokio::test]
async fn public_start_is_limited_to_flagged_providers() {
    let app = test_app();
    let (status, headers, _) = send(
        &app,
        request("GET", "/public/oauth/teams/start?correlation_id=signup-42", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        query_param(&location(&headers), "state").as_deref(),
        Some("signup-42")
    );

    let (status, _, _) = send(
        &app,
        request("GET", "/public/oauth/jira/start?correlation_id=signup-42", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn refresh_swaps_the_access_token() {
    let app = test_app();
    let (_, headers, _) = send(&app, request("GET", "/api/connections/slack/oauth/start", ALICE, None)).await;
    let state = query_param(&location(&headers), "state").unwrap_or_else(|| panic!("state missing"));
    send(
        &app,
        request(
            "GET",
            &format!("/api/connections/slack/oauth/callback?code=abc&state={state}"),
            ALICE,
            None,
        ),
    )
    .await;

    let (status, _, refreshed) =
        send(&app, request("POST", "/api/connections/slack/refresh", ALICE, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["has_refresh_token"], true);

    let (status, _, _) = send(&app, request("POST", "/api/connections/teams/refresh", ALICE, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let app = test_app();
    send(
        &app,
        request(
            "POST",
            "/api/connections/slack",
            ALICE,
            Some(json!({ "access_token": "xoxb", "team_id": "T1" })),
        ),
    )
    .await;

    let (status, _, _) = send(&app, request("GET", "/api/admin/connections", ALICE, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, all) = send(
        &app,
        request("GET", "/api/admin/connections?provider=slack&limit=10", ADMIN, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().map(Vec::len), Some(1));

    let (status, _, deleted) =
        send(&app, request("DELETE", "/api/admin/connections/slack", ADMIN, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted_count"], 1);
}

#[tokio::test]
async fn admin_routes_refuse_non_admins_before_reading_filters() {
    let app = test_app();
    let contributor = Some(("bob@example.com", "contributor"));

    for uri in [
        "/api/admin/connections?limit=0",
        "/api/admin/connections?provider=bogus",
    ] {
        let (status, _, _) = send(&app, request("GET", uri, contributor, None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }

    let (status, _, _) =
        send(&app, request("DELETE", "/api/admin/connections/bogus", contributor, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) =
        send(&app, request("GET", "/api/admin/connections?limit=0", ADMIN, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn jira_disconnect_deactivates_and_needs_admin() {
    let app = test_app();
    send(
        &app,
        request(
            "POST",
            "/api/connections/jira",
            ADMIN,
            Some(json!({ "access_token": "jira-token", "cloud_id": "cloud-1" })),
        ),
    )
    .await;

    let (status, _, _) = send(&app, request("DELETE", "/api/connections/jira", ALICE, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, outcome) = send(&app, request("DELETE", "/api/connections/jira", ADMIN, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "deactivated");

    let (_, _, listed) = send(&app, request("GET", "/api/connections", ADMIN, None)).await;
    assert_eq!(listed[0]["is_active"], false);
}

#[tokio::test]
async fn invitation_lifecycle_grants_membership_once() {
    let app = test_app();
    let (status, _, issued) = send(
        &app,
        request(
            "POST",
            "/api/invitations",
            ADMIN,
            Some(json!({ "email": "new@example.com", "role": "contributor", "workspace_id": "ws-1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(issued["kind"], "invitation");
    assert_eq!(app.emails.count(), 1);
    let token = app.emails.last_token();
    assert!(!issued.to_string().contains(&token));

    let (status, _, validated) = send(
        &app,
        request("POST", "/public/invitations/validate", None, Some(json!({ "token": token }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validated["status"], "pending");

    let (status, _, membership) = send(
        &app,
        request("POST", "/public/invitations/accept", None, Some(json!({ "token": token }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(membership["role"], "contributor");

    let (status, _, again) = send(
        &app,
        request("POST", "/public/invitations/accept", None, Some(json!({ "token": token }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(again["code"], "already_consumed");

    let (status, _, updated) = send(
        &app,
        request(
            "PUT",
            "/api/admin/workspaces/ws-1/members/new@example.com",
            ADMIN,
            Some(json!({ "role": "admin" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role"], "admin");
}

#[tokio::test]
async fn members_cannot_send_invitations() {
    let app = test_app();
    let (status, _, _) = send(
        &app,
        request(
            "POST",
            "/api/invitations",
            ALICE,
            Some(json!({ "email": "x@example.com", "role": "member", "workspace_id": "ws-1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.emails.count(), 0);
}

#[tokio::test]
async fn oversized_validity_is_forbidden_for_members_and_invalid_for_admins() {
    let app = test_app();
    let invitation = json!({
        "email": "x@example.com",
        "role": "member",
        "workspace_id": "ws-1",
        "validity_days": i64::MAX
    });

    let (status, _, _) = send(
        &app,
        request("POST", "/api/invitations", ALICE, Some(invitation.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, error) =
        send(&app, request("POST", "/api/invitations", ADMIN, Some(invitation))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "validation_error");

    let (status, _, _) = send(
        &app,
        request(
            "POST",
            "/api/activations",
            ADMIN,
            Some(json!({
                "email": "client@example.com",
                "client_id": "client-7",
                "validity_hours": i64::MIN
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.emails.count(), 0);
}

#[tokio::test]
async fn activation_confirm_returns_client_id() {
    let app = test_app();
    let (status, _, _) = send(
        &app,
        request(
            "POST",
            "/api/activations",
            ADMIN,
            Some(json!({ "email": "client@example.com", "client_id": "client-7" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = app.emails.last_token();

    let (status, _, confirmed) = send(
        &app,
        request("POST", "/public/activations/confirm", None, Some(json!({ "token": token }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["client_id"], "client-7");
    assert_eq!(confirmed["email"], "client@example.com");
}

#[tokio::test]
async fn password_reset_response_is_generic() {
    let app = test_app();
    let (valid_status, _, valid) = send(
        &app,
        request("POST", "/public/password-resets", None, Some(json!({ "email": "user@example.com" }))),
    )
    .await;
    let (invalid_status, _, invalid) = send(
        &app,
        request("POST", "/public/password-resets", None, Some(json!({ "email": "not-an-email" }))),
    )
    .await;
    assert_eq!(valid_status, StatusCode::ACCEPTED);
    assert_eq!(invalid_status, StatusCode::ACCEPTED);
    assert_eq!(valid, invalid);
    assert_eq!(app.emails.count(), 1);

    let token = app.emails.last_token();
    let (status, _, consumed) = send(
        &app,
        request("POST", "/public/password-resets/consume", None, Some(json!({ "token": token }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(consumed["email"], "user@example.com");
}

#[tokio::test]
async fn malformed_tokens_are_rejected_before_lookup() {
    let app = test_app();
    let (status, _, body) = send(
        &app,
        request(
            "POST",
            "/public/password-resets/validate",
            None,
            Some(json!({ "token": "../../etc/passwd" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, _, _) = send(
        &app,
        request(
            "POST",
            "/public/activations/validate",
            None,
            Some(json!({ "token": "ab".repeat(32) })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
