//! Scope Middleware
//!
//! Runs after the session check and stores the caller's `AccessScope`
//! next to the `Principal` in the request extensions.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::scope::Principal;
use std::sync::Arc;

use crate::application::ResolveScopeUseCase;
use crate::domain::repository::HealthCenterRepository;
use crate::error::CareError;

#[derive(Clone)]
pub struct ScopeMiddlewareState<H>
where
    H: HealthCenterRepository + Clone + Send + Sync + 'static,
{
    pub centers: Arc<H>,
}

impl<H> ScopeMiddlewareState<H>
where
    H: HealthCenterRepository + Clone + Send + Sync + 'static,
{
    pub fn new(centers: Arc<H>) -> Self {
        Self { centers }
    }
}

/// `Principal` から `AccessScope` を解決
pub async fn resolve_access_scope<H>(
    State(state): State<ScopeMiddlewareState<H>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    H: HealthCenterRepository + Clone + Send + Sync + 'static,
{
    let principal = req
        .extensions()
        .get::<Principal>()
        .cloned()
        .ok_or_else(|| CareError::Unauthenticated.into_response())?;

    let scope = ResolveScopeUseCase::new(state.centers.clone())
        .execute(&principal)
        .await
        .map_err(IntoResponse::into_response)?;

    tracing::debug!(user_id = %principal.user_id, scope = ?scope, "Access scope resolved");
    req.extensions_mut().insert(scope);

    Ok(next.run(req).await)
}
