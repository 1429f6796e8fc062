//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::{
    AuthRepository, AuthSessionRepository, HealthCenterDirectory, UserRepository,
};
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState, UsersAppState};
use crate::presentation::middleware::{AuthMiddlewareState, require_auth_session};

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    auth_router_generic(repo, config)
}

/// Create a generic Auth router for any repository implementation
///
/// `/signin`, `/signout` and `/status` are public; the rest require a session.
pub fn auth_router_generic<R>(repo: R, config: AuthConfig) -> Router
where
    R: UserRepository + AuthRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    let state = AuthAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
    };
    let guard = AuthMiddlewareState::new(state.repo.clone(), state.config.clone());

    let protected = Router::new()
        .route("/me", get(handlers::me::<R>))
        .route("/totp/setup", post(handlers::totp_setup::<R>))
        .route("/totp/verify", post(handlers::totp_verify::<R>))
        .route("/totp/disable", post(handlers::totp_disable::<R>))
        .route_layer(middleware::from_fn_with_state(
            guard,
            require_auth_session::<R>,
        ));

    Router::new()
        .route("/signin", post(handlers::sign_in::<R>))
        .route("/signout", post(handlers::sign_out::<R>))
        .route("/status", get(handlers::session_status::<R>))
        .merge(protected)
        .with_state(state)
}

/// User administration router
///
/// Expects `Principal` and `AccessScope` in the request extensions, so the
/// caller must layer the session and scope middleware on top.
pub fn users_router<R, D>(repo: R, directory: D, config: AuthConfig) -> Router
where
    R: UserRepository + AuthRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    let state = UsersAppState {
        repo: Arc::new(repo),
        directory: Arc::new(directory),
        config: Arc::new(config),
    };

    Router::new()
        .route(
            "/",
            get(handlers::list_users::<R, D>).post(handlers::create_user::<R, D>),
        )
        .route("/{id}/activate", post(handlers::activate_user::<R, D>))
        .route("/{id}/deactivate", post(handlers::deactivate_user::<R, D>))
        .with_state(state)
}
