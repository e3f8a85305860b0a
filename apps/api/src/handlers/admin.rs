use axum::Json;
use axum::extract::{Extension, Path, Query, State};

use tessera_application::{AuthorizationGate, ConnectionQuery};
use tessera_core::Principal;
use tessera_domain::Capability;

use crate::dto::{
    AdminConnectionsQuery, BulkDeleteResponse, ConnectionResponse, MembershipResponse,
    UpdateMemberRoleRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::parse_provider;

pub async fn list_all_connections_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AdminConnectionsQuery>,
) -> ApiResult<Json<Vec<ConnectionResponse>>> {
    // Non-admins are refused before their filters are inspected.
    AuthorizationGate::authorize(&principal, Capability::ConnectionListAll)?;
    let defaults = ConnectionQuery::default();
    let connection_query = ConnectionQuery {
        user_email: query
            .user_email
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty()),
        provider: query
            .provider
            .as_deref()
            .map(parse_provider)
            .transpose()?,
        active_only: query.active_only.unwrap_or(defaults.active_only),
        limit: query.limit.unwrap_or(defaults.limit),
        offset: query.offset.unwrap_or(defaults.offset),
    };

    let connections = state
        .connection_service
        .list_all_connections(&principal, &connection_query)
        .await?
        .into_iter()
        .map(ConnectionResponse::from)
        .collect();

    Ok(Json(connections))
}

pub async fn delete_provider_connections_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(provider): Path<String>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    AuthorizationGate::authorize(&principal, Capability::ConnectionBulkDelete)?;
    let provider = parse_provider(&provider)?;
    let result = state
        .connection_service
        .delete_all_for_provider(&principal, provider)
        .await?;

    Ok(Json(BulkDeleteResponse::from(result)))
}

pub async fn update_member_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((workspace_id, email)): Path<(String, String)>,
    Json(payload): Json<UpdateMemberRoleRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let membership = state
        .membership_service
        .update_member_role(&principal, &workspace_id, &email, payload.role)
        .await?;

    Ok(Json(MembershipResponse::from(membership)))
}
