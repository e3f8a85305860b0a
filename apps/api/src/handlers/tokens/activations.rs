use super::*;

pub async fn send_activation_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<SendActivationRequest>,
) -> ApiResult<(StatusCode, Json<IssuedTokenResponse>)> {
    AuthorizationGate::authorize(&principal, Capability::ActivationIssue)?;
    let validity = window_from_hours(
        payload
            .validity_hours
            .unwrap_or(DEFAULT_ACTIVATION_VALIDITY_HOURS),
    )?;
    let token = state
        .token_delivery_service
        .send_activation(&principal, &payload.email, &payload.client_id, validity)
        .await?;

    Ok((StatusCode::CREATED, Json(IssuedTokenResponse::from(token))))
}

pub async fn validate_activation_handler(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> ApiResult<Json<VerificationTokenResponse>> {
    let token = state
        .verification_token_service
        .validate(TokenKind::Activation, &payload.token)
        .await?;

    Ok(Json(VerificationTokenResponse::from(token)))
}

pub async fn confirm_activation_handler(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> ApiResult<Json<ActivationConfirmResponse>> {
    let token = state
        .verification_token_service
        .consume(TokenKind::Activation, &payload.token)
        .await?;

    let TokenPayload::Activation { client_id } = token.payload else {
        return Err(AppError::Internal(format!(
            "activation token {} carries a foreign payload",
            token.id
        ))
        .into());
    };

    Ok(Json(ActivationConfirmResponse {
        email: token.email,
        client_id,
    }))
}
