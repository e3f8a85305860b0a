use super::*;

pub async fn send_invitation_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<SendInvitationRequest>,
) -> ApiResult<(StatusCode, Json<IssuedTokenResponse>)> {
    AuthorizationGate::authorize(&principal, Capability::InvitationSend)?;
    let validity = window_from_days(
        payload
            .validity_days
            .unwrap_or(DEFAULT_INVITATION_VALIDITY_DAYS),
    )?;
    let token = state
        .token_delivery_service
        .send_invitation(
            &principal,
            &payload.email,
            payload.role,
            &payload.workspace_id,
            validity,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(IssuedTokenResponse::from(token))))
}

pub async fn validate_invitation_handler(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> ApiResult<Json<VerificationTokenResponse>> {
    let token = state
        .verification_token_service
        .validate(TokenKind::Invitation, &payload.token)
        .await?;

    Ok(Json(VerificationTokenResponse::from(token)))
}

pub async fn accept_invitation_handler(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let membership = state
        .membership_service
        .accept_invitation(&payload.token)
        .await?;

    Ok(Json(MembershipResponse::from(membership)))
}

pub async fn reject_invitation_handler(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> ApiResult<Json<VerificationTokenResponse>> {
    let token = state
        .verification_token_service
        .reject(TokenKind::Invitation, &payload.token)
        .await?;

    Ok(Json(VerificationTokenResponse::from(token)))
}
