use async_trait::async_trait;
use tessera_core::AppResult;

/// Templated message handed to the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text_body: String,
    /// Display name of the sender.
    pub from_name: String,
}

/// Port for sending emails. Infrastructure provides SMTP or console implementations.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends a plain-text email.
    async fn send_email(&self, email: &OutboundEmail) -> AppResult<()>;
}
