mod common;
mod connections;
mod tokens;

pub use common::{GenericMessageResponse, HealthResponse};
pub use connections::{
    AdminConnectionsQuery, BulkDeleteResponse, ConnectionResponse, DisconnectResponse,
    MembershipResponse, OAuthCallbackQuery, OAuthStartQuery, ProviderResourceResponse,
    PublicOAuthStartQuery, UpdateMemberRoleRequest,
};
pub use tokens::{
    ActivationConfirmResponse, IssuedTokenResponse, PasswordResetConsumeResponse,
    PasswordResetRequest, SendActivationRequest, SendInvitationRequest, TokenRequest,
    VerificationTokenResponse,
};
