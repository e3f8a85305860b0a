use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;
use tessera_application::AuthorizationGate;
use tessera_core::{Principal, Role};

use crate::error::ApiResult;
use crate::state::AppState;

pub const GATEWAY_SECRET_HEADER: &str = "x-gateway-secret";
pub const PRINCIPAL_EMAIL_HEADER: &str = "x-principal-email";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";

/// Resolves the gateway-asserted principal and rejects anonymous callers.
pub async fn require_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let principal = principal_from_headers(request.headers(), &state.gateway_secret);
    let principal = AuthorizationGate::require_principal(principal.as_ref())?.clone();

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Reads the principal headers, trusting them only alongside the shared secret.
pub(crate) fn principal_from_headers(headers: &HeaderMap, gateway_secret: &str) -> Option<Principal> {
    let presented = headers.get(GATEWAY_SECRET_HEADER)?;
    if !bool::from(presented.as_bytes().ct_eq(gateway_secret.as_bytes())) {
        tracing::warn!("principal headers rejected: gateway secret mismatch");
        return None;
    }

    let email = headers
        .get(PRINCIPAL_EMAIL_HEADER)?
        .to_str()
        .ok()?
        .trim();
    if email.is_empty() || !email.contains('@') {
        return None;
    }

    let role = headers
        .get(PRINCIPAL_ROLE_HEADER)?
        .to_str()
        .ok()?
        .parse::<Role>()
        .ok()?;

    Some(Principal::new(email, role))
}
