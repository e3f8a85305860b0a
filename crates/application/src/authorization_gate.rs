//! Single policy point for role-gated operations.
//!
//! Services ask the gate before touching another user's data. Repository
//! methods that bypass per-user ownership take a [`ServiceScope`], which can
//! only be minted here, so every elevated access is visible at the call site.

use tessera_core::{AppError, AppResult, Principal};
use tessera_domain::Capability;
use tracing::{debug, warn};

/// Stateless authorization checks over the [`Capability`] policy table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationGate;

impl AuthorizationGate {
    /// Resolves the acting principal or fails with `Unauthenticated`.
    pub fn require_principal(principal: Option<&Principal>) -> AppResult<&Principal> {
        principal.ok_or_else(|| AppError::Unauthenticated("no principal on request".to_owned()))
    }

    /// Checks that `principal` holds `capability`.
    pub fn authorize(principal: &Principal, capability: Capability) -> AppResult<()> {
        if capability.is_granted_to(principal.role()) {
            return Ok(());
        }

        warn!(
            actor = %principal.email(),
            role = %principal.role(),
            capability = capability.as_str(),
            "authorization denied"
        );
        Err(AppError::Forbidden(format!(
            "role '{}' lacks capability '{}'",
            principal.role(),
            capability.as_str()
        )))
    }

    /// Checks `capability` and mints a scope for the elevated store access it allows.
    pub fn elevate(
        principal: &Principal,
        capability: Capability,
        reason: &'static str,
    ) -> AppResult<ServiceScope> {
        Self::authorize(principal, capability)?;
        debug!(actor = %principal.email(), capability = capability.as_str(), reason, "elevated store access");

        Ok(ServiceScope {
            reason,
            actor: Some(principal.email().to_owned()),
        })
    }
}

/// Capability to perform store operations that bypass per-user ownership.
///
/// Deliberately not `Clone`: each elevated operation mints its own scope.
#[derive(Debug)]
pub struct ServiceScope {
    reason: &'static str,
    actor: Option<String>,
}

impl ServiceScope {
    /// Scope for internal flows that act without a requesting principal,
    /// such as the OAuth callback completing on behalf of a stored owner.
    #[must_use]
    pub fn system(reason: &'static str) -> Self {
        debug!(reason, "system store access");
        Self {
            reason,
            actor: None,
        }
    }

    /// Why the scope was granted.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        self.reason
    }

    /// Email of the elevated principal, absent for system scopes.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }
}
