//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;
mod live;
mod settings;

use std::sync::Arc;

use auth::{AuthMiddlewareState, PgAuthRepository, auth_router, require_auth_session, users_router};
use axum::{
    Router, http,
    http::{Method, header},
    middleware,
};
use care::{PgCareRepository, ScopeMiddlewareState, care_router, resolve_access_scope};
use platform::events::EventBus;
use sqlx::postgres::PgPoolOptions;
use stock::{PgStockRepository, stock_router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::live::live_router;
use crate::settings::{PgSettingsStore, SettingsHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,care=info,stock=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::info!(max_connections = config.max_connections, "Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: remove expired sessions
    // Errors here should not prevent server startup
    let auth_repo = PgAuthRepository::new(pool.clone());
    match auth_repo.cleanup_expired().await {
        Ok(sessions) => {
            tracing::info!(
                sessions_deleted = sessions,
                "Auth session cleanup completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Auth session cleanup failed, continuing anyway"
            );
        }
    }

    let care_repo = PgCareRepository::new(pool.clone());
    let stock_repo = PgStockRepository::new(pool.clone());
    let settings = Arc::new(SettingsHandle::load(PgSettingsStore::new(pool.clone())).await?);
    let events = EventBus::default();

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Everything below needs a session (outer layer) and a scope (inner layer)
    let auth_guard = AuthMiddlewareState::new(
        Arc::new(auth_repo.clone()),
        Arc::new(config.auth.clone()),
    );
    let scope_guard = ScopeMiddlewareState::new(Arc::new(care_repo.clone()));

    let protected = Router::new()
        .nest(
            "/users",
            users_router(auth_repo.clone(), care_repo.clone(), config.auth.clone()),
        )
        .nest(
            "/stocks",
            stock_router(stock_repo.clone(), care_repo.clone(), events.clone()),
        )
        .merge(care_router(care_repo.clone(), stock_repo, events.clone()))
        .merge(settings::admin_router(settings.clone()))
        .merge(live_router(events))
        .route_layer(middleware::from_fn_with_state(
            scope_guard,
            resolve_access_scope::<PgCareRepository>,
        ))
        .route_layer(middleware::from_fn_with_state(
            auth_guard,
            require_auth_session::<PgAuthRepository>,
        ));

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(auth_repo, config.auth.clone()))
        .nest(
            "/api",
            settings::public_router(settings).merge(protected),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
