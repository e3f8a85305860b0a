use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Routes reachable without a principal: emailed links and pre-session consent.
pub(super) fn build_public_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/public/oauth/{provider}/start",
            get(handlers::oauth::public_oauth_start_handler),
        )
        .route(
            "/public/invitations/validate",
            post(handlers::tokens::validate_invitation_handler),
        )
        .route(
            "/public/invitations/accept",
            post(handlers::tokens::accept_invitation_handler),
        )
        .route(
            "/public/invitations/reject",
            post(handlers::tokens::reject_invitation_handler),
        )
        .route(
            "/public/activations/validate",
            post(handlers::tokens::validate_activation_handler),
        )
        .route(
            "/public/activations/confirm",
            post(handlers::tokens::confirm_activation_handler),
        )
        .route(
            "/public/password-resets",
            post(handlers::tokens::request_password_reset_handler),
        )
        .route(
            "/public/password-resets/validate",
            post(handlers::tokens::validate_password_reset_handler),
        )
        .route(
            "/public/password-resets/consume",
            post(handlers::tokens::consume_password_reset_handler),
        )
}
