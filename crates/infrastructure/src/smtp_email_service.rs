//! SMTP email service using the `lettre` crate.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tessera_application::{EmailService, OutboundEmail};
use tessera_core::{AppError, AppResult};

/// SMTP email service configuration.
#[derive(Clone)]
pub struct SmtpEmailConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// Sender email address.
    pub from_address: String,
}

impl std::fmt::Debug for SmtpEmailConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SmtpEmailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_address", &self.from_address)
            .finish()
    }
}

/// Production email service using SMTP.
pub struct SmtpEmailService {
    config: SmtpEmailConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    /// Creates a new SMTP email service with a pooled relay transport.
    pub fn new(config: SmtpEmailConfig) -> AppResult<Self> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|error| {
                AppError::Configuration(format!("failed to create SMTP transport: {error}"))
            })?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self { config, mailer })
    }

    fn sender(&self, from_name: &str) -> AppResult<Mailbox> {
        let address = self.config.from_address.parse::<Address>().map_err(|error| {
            AppError::Configuration(format!("invalid from address: {error}"))
        })?;
        let name = Some(from_name.trim().to_owned()).filter(|name| !name.is_empty());
        Ok(Mailbox::new(name, address))
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_email(&self, email: &OutboundEmail) -> AppResult<()> {
        let recipient = email
            .to
            .parse::<Mailbox>()
            .map_err(|error| AppError::Validation(format!("invalid recipient address: {error}")))?;

        let message = Message::builder()
            .from(self.sender(&email.from_name)?)
            .to(recipient)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.text_body.clone())
            .map_err(|error| AppError::Internal(format!("failed to build email: {error}")))?;

        self.mailer
            .send(message)
            .await
            .map_err(|error| AppError::Upstream(format!("failed to send email: {error}")))?;

        Ok(())
    }
}
