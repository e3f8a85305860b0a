use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use tessera_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;
mod public_routes;

#[cfg(test)]
mod tests;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/connections",
            get(handlers::connections::list_connections_handler),
        )
        .route(
            "/api/connections/{provider}",
            post(handlers::connections::save_connection_handler)
                .delete(handlers::connections::disconnect_handler),
        )
        .route(
            "/api/connections/{provider}/refresh",
            post(handlers::connections::refresh_connection_handler),
        )
        .route(
            "/api/connections/{provider}/resources",
            get(handlers::connections::list_provider_resources_handler),
        )
        .route(
            "/api/connections/{provider}/oauth/start",
            get(handlers::oauth::oauth_start_handler),
        )
        .route(
            "/api/connections/{provider}/oauth/callback",
            get(handlers::oauth::oauth_callback_handler),
        )
        .route(
            "/api/admin/connections",
            get(handlers::admin::list_all_connections_handler),
        )
        .route(
            "/api/admin/connections/{provider}",
            delete(handlers::admin::delete_provider_connections_handler),
        )
        .route(
            "/api/admin/workspaces/{workspace_id}/members/{email}",
            put(handlers::admin::update_member_role_handler),
        )
        .route(
            "/api/invitations",
            post(handlers::tokens::send_invitation_handler),
        )
        .route(
            "/api/activations",
            post(handlers::tokens::send_activation_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_principal,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(public_routes::build_public_routes())
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
