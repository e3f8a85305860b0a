use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use tessera_application::AuthorizationGate;
use tessera_core::{AppError, Principal};
use tessera_domain::{Capability, TokenKind, TokenPayload, window_from_days, window_from_hours};

use crate::dto::{
    ActivationConfirmResponse, GenericMessageResponse, IssuedTokenResponse, MembershipResponse,
    PasswordResetConsumeResponse, PasswordResetRequest, SendActivationRequest,
    SendInvitationRequest, TokenRequest, VerificationTokenResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod activations;
mod invitations;
mod password_resets;

pub use activations::{
    confirm_activation_handler, send_activation_handler, validate_activation_handler,
};
pub use invitations::{
    accept_invitation_handler, reject_invitation_handler, send_invitation_handler,
    validate_invitation_handler,
};
pub use password_resets::{
    consume_password_reset_handler, request_password_reset_handler,
    validate_password_reset_handler,
};

const DEFAULT_INVITATION_VALIDITY_DAYS: i64 = 7;
const DEFAULT_ACTIVATION_VALIDITY_HOURS: i64 = 48;
