use chrono::{DateTime, Utc};
use tessera_core::Role;

/// Role held by one email inside one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceMembership {
    /// Workspace identifier.
    pub workspace_id: String,
    /// Member email.
    pub email: String,
    /// Member role.
    pub role: Role,
    /// Last time the membership was written.
    pub updated_at: DateTime<Utc>,
}
