use super::*;

pub async fn request_password_reset_handler(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> ApiResult<(StatusCode, Json<GenericMessageResponse>)> {
    state
        .token_delivery_service
        .request_password_reset(&payload.email)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(GenericMessageResponse {
            message: "If that address is registered, a reset link is on its way.".to_owned(),
        }),
    ))
}

pub async fn validate_password_reset_handler(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> ApiResult<Json<VerificationTokenResponse>> {
    let token = state
        .verification_token_service
        .validate(TokenKind::PasswordReset, &payload.token)
        .await?;

    Ok(Json(VerificationTokenResponse::from(token)))
}

pub async fn consume_password_reset_handler(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> ApiResult<Json<PasswordResetConsumeResponse>> {
    let token = state
        .verification_token_service
        .consume(TokenKind::PasswordReset, &payload.token)
        .await?;

    Ok(Json(PasswordResetConsumeResponse { email: token.email }))
}
