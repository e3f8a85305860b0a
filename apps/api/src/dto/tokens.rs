use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_core::Role;
use tessera_domain::{TokenKind, TokenPayload, TokenStatus, VerificationToken};

/// Incoming payload for sending an invitation.
#[derive(Debug, Deserialize)]
pub struct SendInvitationRequest {
    pub email: String,
    pub role: Role,
    pub workspace_id: String,
    /// Defaults to seven days.
    pub validity_days: Option<i64>,
}

/// Incoming payload for issuing an activation.
#[derive(Debug, Deserialize)]
pub struct SendActivationRequest {
    pub email: String,
    pub client_id: String,
    /// Defaults to 48 hours.
    pub validity_hours: Option<i64>,
}

/// Raw token submitted from an emailed link.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

/// Incoming payload for requesting a password reset.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Metadata about a token that was just issued. The raw value is only emailed.
#[derive(Debug, Serialize)]
pub struct IssuedTokenResponse {
    pub id: String,
    pub kind: TokenKind,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl From<VerificationToken> for IssuedTokenResponse {
    fn from(value: VerificationToken) -> Self {
        Self {
            id: value.id.to_string(),
            kind: value.kind,
            email: value.email,
            expires_at: value.expires_at,
        }
    }
}

/// Token state returned by validate/reject.
#[derive(Debug, Serialize)]
pub struct VerificationTokenResponse {
    pub kind: TokenKind,
    pub email: String,
    pub status: TokenStatus,
    pub expires_at: DateTime<Utc>,
    pub payload: TokenPayload,
}

impl From<VerificationToken> for VerificationTokenResponse {
    fn from(value: VerificationToken) -> Self {
        Self {
            kind: value.kind,
            email: value.email,
            status: value.status,
            expires_at: value.expires_at,
            payload: value.payload,
        }
    }
}

/// Result of confirming an activation.
#[derive(Debug, Serialize)]
pub struct ActivationConfirmResponse {
    pub email: String,
    pub client_id: String,
}

/// Result of consuming a password reset; the identity system sets the password.
#[derive(Debug, Serialize)]
pub struct PasswordResetConsumeResponse {
    pub email: String,
}
