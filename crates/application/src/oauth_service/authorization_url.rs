use tessera_core::{AppError, AppResult};
use tessera_domain::ProviderDescriptor;

use super::AuthorizationState;
use crate::OAuthClientConfig;

/// Minimum nonce length in hex characters (128 bits).
const MIN_NONCE_LEN: usize = 32;
const MAX_CORRELATION_LEN: usize = 256;

/// Builds the provider authorize URL.
///
/// Scopes are space-joined and every value is percent-encoded. Empty `scopes`
/// fall back to the provider defaults. The client secret never appears in
/// the URL.
pub fn build_authorization_url(
    descriptor: &ProviderDescriptor,
    client: &OAuthClientConfig,
    scopes: &[String],
    state: &AuthorizationState,
) -> AppResult<String> {
    let client_id = client.client_id.trim();
    if client_id.is_empty() {
        return Err(AppError::Configuration(format!(
            "OAuth client id for {} is empty",
            descriptor.provider
        )));
    }

    let redirect_uri = client.redirect_uri.trim();
    if !(redirect_uri.starts_with("https://") || redirect_uri.starts_with("http://")) {
        return Err(AppError::Configuration(format!(
            "OAuth redirect URI for {} must be an absolute http(s) URL",
            descriptor.provider
        )));
    }

    validate_state(state)?;

    let mut requested = scopes
        .iter()
        .map(|scope| scope.trim())
        .filter(|scope| !scope.is_empty())
        .map(str::to_owned)
        .collect::<Vec<_>>();
    if requested.is_empty() {
        requested = descriptor.default_scope_list();
    }

    let mut params = vec![
        (descriptor.client_id_param, client_id.to_owned()),
        ("response_type", descriptor.response_type.as_str().to_owned()),
        (descriptor.redirect_uri_param, redirect_uri.to_owned()),
        ("scope", requested.join(" ")),
        ("state", state.value().to_owned()),
    ];
    params.extend(
        descriptor
            .extra_authorize_params
            .iter()
            .map(|(name, value)| (*name, (*value).to_owned())),
    );

    let query = params
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!("{}?{query}", descriptor.authorize_endpoint))
}

fn validate_state(state: &AuthorizationState) -> AppResult<()> {
    match state {
        AuthorizationState::Nonce(value) if value.len() < MIN_NONCE_LEN => Err(
            AppError::Validation("state nonce must carry at least 128 bits".to_owned()),
        ),
        AuthorizationState::Correlation(value) if value.trim().is_empty() => Err(
            AppError::Validation("correlation id must not be empty".to_owned()),
        ),
        AuthorizationState::Correlation(value) if value.len() > MAX_CORRELATION_LEN => {
            Err(AppError::Validation(format!(
                "correlation id must not exceed {MAX_CORRELATION_LEN} characters"
            )))
        }
        AuthorizationState::Nonce(_) | AuthorizationState::Correlation(_) => Ok(()),
    }
}
