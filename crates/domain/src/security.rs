use tessera_core::Role;

/// Operations gated by the authorization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create, refresh, use and disconnect one's own connections.
    ConnectionManageOwn,
    /// Soft-revoke a shared connection not strictly owned by the actor.
    ConnectionRevokeShared,
    /// Enumerate every user's connections.
    ConnectionListAll,
    /// Delete all connections of a provider across users.
    ConnectionBulkDelete,
    /// Invite someone into a workspace.
    InvitationSend,
    /// Issue account activation tokens.
    ActivationIssue,
    /// Change another member's workspace role.
    MemberRoleUpdate,
}

impl Capability {
    /// Returns a stable value used in logs and error messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionManageOwn => "connection.manage_own",
            Self::ConnectionRevokeShared => "connection.revoke_shared",
            Self::ConnectionListAll => "connection.list_all",
            Self::ConnectionBulkDelete => "connection.bulk_delete",
            Self::InvitationSend => "invitation.send",
            Self::ActivationIssue => "activation.issue",
            Self::MemberRoleUpdate => "member.role_update",
        }
    }

    /// The policy table: whether `role` holds this capability.
    #[must_use]
    pub fn is_granted_to(&self, role: Role) -> bool {
        match self {
            Self::ConnectionManageOwn => true,
            Self::ConnectionRevokeShared
            | Self::ConnectionListAll
            | Self::ConnectionBulkDelete
            | Self::InvitationSend
            | Self::ActivationIssue
            | Self::MemberRoleUpdate => role == Role::Admin,
        }
    }
}
