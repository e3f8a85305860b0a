use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use tessera_core::Principal;
use tessera_domain::CredentialFields;

use crate::dto::{ConnectionResponse, DisconnectResponse, ProviderResourceResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::parse_provider;

pub async fn list_connections_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<ConnectionResponse>>> {
    let connections = state
        .connection_service
        .list_connections(&principal, None)
        .await?
        .into_iter()
        .map(ConnectionResponse::from)
        .collect();

    Ok(Json(connections))
}

pub async fn save_connection_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(provider): Path<String>,
    Json(payload): Json<CredentialFields>,
) -> ApiResult<(StatusCode, Json<ConnectionResponse>)> {
    let provider = parse_provider(&provider)?;
    let connection = state
        .connection_service
        .save_connection(&principal, provider, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(ConnectionResponse::from(connection))))
}

pub async fn disconnect_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(provider): Path<String>,
) -> ApiResult<Json<DisconnectResponse>> {
    let provider = parse_provider(&provider)?;
    let outcome = state
        .connection_service
        .disconnect(&principal, provider)
        .await?;

    Ok(Json(DisconnectResponse::new(provider.as_str(), outcome)))
}

pub async fn refresh_connection_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(provider): Path<String>,
) -> ApiResult<Json<ConnectionResponse>> {
    let provider = parse_provider(&provider)?;
    let connection = state
        .oauth_service
        .refresh_connection(&principal, provider)
        .await?;

    Ok(Json(ConnectionResponse::from(connection)))
}

pub async fn list_provider_resources_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(provider): Path<String>,
) -> ApiResult<Json<Vec<ProviderResourceResponse>>> {
    let provider = parse_provider(&provider)?;
    let resources = state
        .provider_proxy_service
        .list_resources(&principal, provider)
        .await?
        .into_iter()
        .map(ProviderResourceResponse::from)
        .collect();

    Ok(Json(resources))
}
