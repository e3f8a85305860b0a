use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use tessera_application::AuthorizationRedirect;
use tessera_core::Principal;

use crate::dto::{ConnectionResponse, OAuthCallbackQuery, OAuthStartQuery, PublicOAuthStartQuery};
use crate::error::ApiResult;
use crate::state::AppState;

use super::parse_provider;

pub async fn oauth_start_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthStartQuery>,
) -> ApiResult<Response> {
    let provider = parse_provider(&provider)?;
    let redirect = state
        .oauth_service
        .begin_authorization(&principal, provider, &query.scope_list())
        .await?;

    Ok(found(redirect))
}

pub async fn oauth_callback_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
) -> ApiResult<(StatusCode, Json<ConnectionResponse>)> {
    let provider = parse_provider(&provider)?;
    let connection = state
        .oauth_service
        .complete_authorization(&principal, provider, &query.into())
        .await?;

    Ok((StatusCode::CREATED, Json(ConnectionResponse::from(connection))))
}

pub async fn public_oauth_start_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<PublicOAuthStartQuery>,
) -> ApiResult<Response> {
    let provider = parse_provider(&provider)?;
    let redirect = state
        .oauth_service
        .begin_public_authorization(provider, &query.correlation_id)?;

    Ok(found(redirect))
}

fn found(redirect: AuthorizationRedirect) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, redirect.url)]).into_response()
}
