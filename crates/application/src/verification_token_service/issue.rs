use super::*;

impl VerificationTokenService {
    /// Issues a token carrying `payload` for `email`.
    ///
    /// `validity` must be `None` for password resets and a positive window of
    /// at most thirty days otherwise.
    pub async fn issue(
        &self,
        email: &str,
        payload: TokenPayload,
        validity: Option<Duration>,
    ) -> AppResult<IssuedToken> {
        let email = EmailAddress::new(email)?;
        let kind = payload.kind();
        let window = validity_window(kind, validity)?;

        let (raw_token, token_hash) = generate_token()?;
        let created_at = self.clock.now();
        let token = self
            .repository
            .create_token(NewVerificationToken {
                token_hash,
                email: email.into(),
                payload,
                expires_at: created_at + window,
                created_at,
            })
            .await?;

        tracing::info!(
            token_id = %token.id,
            kind = kind.as_str(),
            expires_at = %token.expires_at,
            "verification token issued"
        );
        Ok(IssuedToken { token, raw_token })
    }

    /// Issues a workspace invitation. Requires the invitation capability.
    pub async fn issue_invitation(
        &self,
        actor: &Principal,
        email: &str,
        role: Role,
        workspace_id: &str,
        validity: Duration,
    ) -> AppResult<IssuedToken> {
        AuthorizationGate::authorize(actor, Capability::InvitationSend)?;
        let workspace_id = workspace_id.trim();
        if workspace_id.is_empty() {
            return Err(AppError::Validation("workspace_id must not be empty".to_owned()));
        }

        self.issue(
            email,
            TokenPayload::Invitation {
                role,
                workspace_id: workspace_id.to_owned(),
                invited_by: actor.email().to_owned(),
            },
            Some(validity),
        )
        .await
    }

    /// Issues an account activation token. Requires the activation capability.
    pub async fn issue_activation(
        &self,
        actor: &Principal,
        email: &str,
        client_id: &str,
        validity: Duration,
    ) -> AppResult<IssuedToken> {
        AuthorizationGate::authorize(actor, Capability::ActivationIssue)?;
        let client_id = client_id.trim();
        if client_id.is_empty() {
            return Err(AppError::Validation("client_id must not be empty".to_owned()));
        }

        self.issue(
            email,
            TokenPayload::Activation {
                client_id: client_id.to_owned(),
            },
            Some(validity),
        )
        .await
    }

    /// Issues a one-hour password reset token.
    pub async fn issue_password_reset(&self, email: &str) -> AppResult<IssuedToken> {
        self.issue(email, TokenPayload::PasswordReset, None).await
    }
}
