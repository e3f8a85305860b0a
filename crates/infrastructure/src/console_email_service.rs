//! Console email service for development. Logs emails to tracing output.
//!
//! Delivery links contain raw tokens, so this adapter must never be selected
//! outside local development.

use async_trait::async_trait;
use tessera_application::{EmailService, OutboundEmail};
use tessera_core::AppResult;
use tracing::info;

/// Development email service that logs emails to the console.
#[derive(Clone, Default)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates a new console email service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_email(&self, email: &OutboundEmail) -> AppResult<()> {
        info!(
            to = %email.to,
            subject = %email.subject,
            "--- EMAIL (console) ---\nFrom: {}\nTo: {}\nSubject: {}\n\n{}\n--- END EMAIL ---",
            email.from_name,
            email.to,
            email.subject,
            email.text_body
        );

        Ok(())
    }
}
