//! Issues verification tokens and emails their links.

use std::sync::Arc;

use chrono::Duration;

use tessera_core::{AppError, AppResult, Principal, Role};
use tessera_domain::{PASSWORD_RESET_VALIDITY_MINUTES, VerificationToken};

use crate::{EmailService, IssuedToken, OutboundEmail, VerificationTokenService};


/// Application service combining token issuance with email delivery.
#[derive(Clone)]
pub struct TokenDeliveryService {
    tokens: VerificationTokenService,
    email_service: Arc<dyn EmailService>,
    frontend_url: String,
    from_name: String,
}

impl TokenDeliveryService {
    /// Creates a new delivery service.
    #[must_use]
    pub fn new(
        tokens: VerificationTokenService,
        email_service: Arc<dyn EmailService>,
        frontend_url: String,
        from_name: String,
    ) -> Self {
        Self {
            tokens,
            email_service,
            frontend_url: frontend_url.trim_end_matches('/').to_owned(),
            from_name,
        }
    }

    /// Issues an invitation and emails the acceptance link.
    pub async fn send_invitation(
        &self,
        actor: &Principal,
        email: &str,
        role: Role,
        workspace_id: &str,
        validity: Duration,
    ) -> AppResult<VerificationToken> {
        let issued = self
            .tokens
            .issue_invitation(actor, email, role, workspace_id, validity)
            .await?;

        let link = self.link("invitations/accept", &issued);
        let subject = format!("{} invited you to join {workspace_id}", actor.email());
        let text_body = format!(
            "{} has invited you to join {workspace_id} as {role}.\n\n\
             Accept the invitation:\n{link}\n\n\
             This link expires in {} days.",
            actor.email(),
            validity.num_days().max(1)
        );
        self.deliver(&issued, subject, text_body).await?;

        Ok(issued.token)
    }

    /// Issues an activation token and emails the activation link.
    pub async fn send_activation(
        &self,
        actor: &Principal,
        email: &str,
        client_id: &str,
        validity: Duration,
    ) -> AppResult<VerificationToken> {
        let issued = self
            .tokens
            .issue_activation(actor, email, client_id, validity)
            .await?;

        let link = self.link("activate", &issued);
        let subject = format!("Activate your {} account", self.from_name);
        let text_body = format!(
            "Your account is ready to activate.\n\n\
             Activate it here:\n{link}\n\n\
             This link expires in {} hours.",
            validity.num_hours().max(1)
        );
        self.deliver(&issued, subject, text_body).await?;

        Ok(issued.token)
    }

    /// Issues a password reset token and emails the reset link.
    ///
    /// Invalid addresses and delivery failures are logged, not returned, so
    /// the caller's response does not reveal anything about the address.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let issued = match self.tokens.issue_password_reset(email).await {
            Ok(issued) => issued,
            Err(AppError::Validation(reason)) => {
                tracing::debug!(reason = %reason, "password reset request ignored");
                return Ok(());
            }
            Err(error) => return Err(error),
        };

        let link = self.link("reset-password", &issued);
        let subject = format!("Reset your {} password", self.from_name);
        let text_body = format!(
            "We received a request to reset your password.\n\n\
             Choose a new password here:\n{link}\n\n\
             This link expires in {PASSWORD_RESET_VALIDITY_MINUTES} minutes. \
             If you did not request a reset, ignore this email."
        );

        if let Err(error) = self.deliver(&issued, subject, text_body).await {
            tracing::warn!(token_id = %issued.token.id, error = %error, "password reset email failed");
        }
        Ok(())
    }

    fn link(&self, path: &str, issued: &IssuedToken) -> String {
        format!(
            "{}/{path}?token={}",
            self.frontend_url,
            urlencoding::encode(&issued.raw_token)
        )
    }

    async fn deliver(
        &self,
        issued: &IssuedToken,
        subject: String,
        text_body: String,
    ) -> AppResult<()> {
        self.email_service
            .send_email(&OutboundEmail {
                to: issued.token.email.clone(),
                subject,
                text_body,
                from_name: self.from_name.clone(),
            })
            .await
    }
}
