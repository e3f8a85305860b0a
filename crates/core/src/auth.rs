use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Closed set of roles a principal can hold in the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Can contribute content but not administer.
    Contributor,
    /// Regular workspace member.
    Member,
}

impl Role {
    /// Returns the stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Contributor => "contributor",
            Self::Member => "member",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "contributor" => Ok(Self::Contributor),
            "member" => Ok(Self::Member),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Acting user resolved by the authorization gate for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    email: String,
    role: Role,
}

impl Principal {
    /// Creates a principal from an already-authenticated email and role.
    ///
    /// The email is normalized to lowercase so ownership keys compare stably.
    #[must_use]
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into().trim().to_lowercase(),
            role,
        }
    }

    /// Returns the principal email, used as the owner key for connections.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the principal role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }
}
