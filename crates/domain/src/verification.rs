//! Single-use verification tokens.
//!
//! Three kinds share one life cycle: a token starts `pending` and moves to
//! exactly one terminal status. Expiry is evaluated lazily against
//! `expires_at`; terminal status is checked before expiry.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tessera_core::{AppError, AppResult, Role};
use uuid::Uuid;

/// Fixed validity of password reset tokens.
pub const PASSWORD_RESET_VALIDITY_MINUTES: i64 = 60;

/// Upper bound for caller-supplied validity windows.
pub const MAX_VALIDITY_WINDOW_DAYS: i64 = 30;

/// Purpose of a verification token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Account activation for a client account.
    Activation,
    /// Team/workspace invitation.
    Invitation,
    /// Password reset.
    PasswordReset,
}

impl TokenKind {
    /// Returns the storage string for this token kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activation => "activation",
            Self::Invitation => "invitation",
            Self::PasswordReset => "password_reset",
        }
    }

    /// Status a successful consumption moves the token to.
    #[must_use]
    pub fn consumed_status(&self) -> TokenStatus {
        match self {
            Self::Invitation => TokenStatus::Accepted,
            Self::Activation | Self::PasswordReset => TokenStatus::Used,
        }
    }

    /// Whether the token can be declined without performing its action.
    #[must_use]
    pub fn supports_rejection(&self) -> bool {
        matches!(self, Self::Invitation)
    }

    /// Whether an observed expiry is persisted as `expired`.
    #[must_use]
    pub fn persists_expiry(&self) -> bool {
        matches!(self, Self::Invitation)
    }
}

impl FromStr for TokenKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "activation" => Ok(Self::Activation),
            "invitation" => Ok(Self::Invitation),
            "password_reset" => Ok(Self::PasswordReset),
            _ => Err(AppError::Validation(format!(
                "unknown token kind '{value}'"
            ))),
        }
    }
}

/// Life-cycle status of a verification token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Issued and not yet resolved.
    Pending,
    /// Consumed (activation, password reset).
    Used,
    /// Invitation accepted.
    Accepted,
    /// Invitation declined.
    Rejected,
    /// Invitation observed past its expiry.
    Expired,
}

impl TokenStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Used => "used",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }

    /// Parses a storage string.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "used" => Ok(Self::Used),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            _ => Err(AppError::Validation(format!(
                "unknown token status '{value}'"
            ))),
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether `self -> to` is an edge of the kind's transition graph.
    #[must_use]
    pub fn can_transition(&self, kind: TokenKind, to: TokenStatus) -> bool {
        if self.is_terminal() {
            return false;
        }

        match kind {
            TokenKind::Invitation => matches!(
                to,
                TokenStatus::Accepted | TokenStatus::Rejected | TokenStatus::Expired
            ),
            TokenKind::Activation | TokenKind::PasswordReset => to == TokenStatus::Used,
        }
    }
}

/// Kind-specific payload carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenPayload {
    /// Activation payload.
    Activation {
        /// Client account being activated.
        client_id: String,
    },
    /// Invitation payload.
    Invitation {
        /// Role granted on acceptance.
        role: Role,
        /// Workspace the invitee joins.
        workspace_id: String,
        /// Email of the inviting principal.
        invited_by: String,
    },
    /// Password reset carries no payload beyond the email.
    PasswordReset,
}

impl TokenPayload {
    /// Returns the token kind this payload belongs to.
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Activation { .. } => TokenKind::Activation,
            Self::Invitation { .. } => TokenKind::Invitation,
            Self::PasswordReset => TokenKind::PasswordReset,
        }
    }
}

/// Resolves the validity window for a new token.
///
/// Password reset tokens always live one hour and do not accept an override.
/// Other kinds require a positive caller-supplied window of at most
/// [`MAX_VALIDITY_WINDOW_DAYS`].
pub fn validity_window(kind: TokenKind, requested: Option<Duration>) -> AppResult<Duration> {
    match (kind, requested) {
        (TokenKind::PasswordReset, None) => Ok(Duration::minutes(PASSWORD_RESET_VALIDITY_MINUTES)),
        (TokenKind::PasswordReset, Some(_)) => Err(AppError::Validation(
            "password reset tokens have a fixed validity window".to_owned(),
        )),
        (_, None) => Err(AppError::Validation(format!(
            "a validity window is required for {} tokens",
            kind.as_str()
        ))),
        (_, Some(window)) if window <= Duration::zero() => Err(AppError::Validation(
            "validity window must be positive".to_owned(),
        )),
        (_, Some(window)) if window > Duration::days(MAX_VALIDITY_WINDOW_DAYS) => {
            Err(AppError::Validation(format!(
                "validity window must not exceed {MAX_VALIDITY_WINDOW_DAYS} days"
            )))
        }
        (_, Some(window)) => Ok(window),
    }
}

/// Converts a caller-supplied number of days into a validity window.
pub fn window_from_days(days: i64) -> AppResult<Duration> {
    Duration::try_days(days).ok_or_else(window_out_of_range)
}

/// Converts a caller-supplied number of hours into a validity window.
pub fn window_from_hours(hours: i64) -> AppResult<Duration> {
    Duration::try_hours(hours).ok_or_else(window_out_of_range)
}

fn window_out_of_range() -> AppError {
    AppError::Validation(format!(
        "validity window must not exceed {MAX_VALIDITY_WINDOW_DAYS} days"
    ))
}

/// Stored verification token. Only the SHA-256 hash of the raw value is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken {
    /// Record identifier.
    pub id: Uuid,
    /// Token purpose.
    pub kind: TokenKind,
    /// SHA-256 hash of the raw token, hex encoded.
    pub token_hash: String,
    /// Subject email (activation/reset subject or invitee).
    pub email: String,
    /// Kind-specific payload.
    pub payload: TokenPayload,
    /// Current status.
    pub status: TokenStatus,
    /// End of the validity window.
    pub expires_at: DateTime<Utc>,
    /// Issuance timestamp.
    pub created_at: DateTime<Utc>,
    /// When the token left `pending`, if it has.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl VerificationToken {
    /// Returns whether `now` is at or past the validity window.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks that the token can still be consumed.
    ///
    /// Consumed state takes precedence over expiry.
    pub fn ensure_pending(&self, now: DateTime<Utc>) -> AppResult<()> {
        match self.status {
            TokenStatus::Pending if self.is_expired_at(now) => Err(AppError::Expired(format!(
                "{} token has expired",
                self.kind.as_str()
            ))),
            TokenStatus::Pending => Ok(()),
            TokenStatus::Expired => Err(AppError::Expired(format!(
                "{} token has expired",
                self.kind.as_str()
            ))),
            TokenStatus::Used | TokenStatus::Accepted | TokenStatus::Rejected => {
                Err(AppError::AlreadyConsumed(format!(
                    "{} token was already {}",
                    self.kind.as_str(),
                    self.status.as_str()
                )))
            }
        }
    }
}
