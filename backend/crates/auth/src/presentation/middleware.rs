//! Auth Middleware
//!
//! Session check for protected routes. On success the caller's
//! `Principal` and [`CurrentSession`] are stored in the request extensions.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::client::fingerprint_from_request;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::CheckSessionUseCase;
use crate::application::config::AuthConfig;
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::error::AuthError;

/// Middleware state
#[derive(Clone)]
pub struct AuthMiddlewareState<R>
where
    R: UserRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

impl<R> AuthMiddlewareState<R>
where
    R: UserRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }
}

/// 検証済みセッションの情報
#[derive(Debug, Clone, Copy)]
pub struct CurrentSession {
    pub session_id: Uuid,
    pub expires_at_ms: i64,
}

/// Middleware that requires a valid auth session
pub async fn require_auth_session<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: UserRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    let fingerprint = fingerprint_from_request(&req).map_err(|e| reject(e.into()))?;

    let token = platform::cookie::extract_cookie(req.headers(), &state.config.session_cookie_name)
        .ok_or_else(|| reject(AuthError::SessionInvalid))?;

    let use_case =
        CheckSessionUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());
    let authenticated = use_case
        .execute(&token, &fingerprint.hash)
        .await
        .map_err(reject)?;

    req.extensions_mut().insert(authenticated.user.principal());
    req.extensions_mut().insert(CurrentSession {
        session_id: authenticated.session.session_id,
        expires_at_ms: authenticated.session.expires_at_ms,
    });

    Ok(next.run(req).await)
}

/// 認証失敗のレスポンス（クライアント向けに X-Auth-Required を付与）
fn reject(err: AuthError) -> Response {
    let mut response = err.into_response();
    if response.status().as_u16() == 401 {
        response
            .headers_mut()
            .insert("X-Auth-Required", HeaderValue::from_static("true"));
    }
    response
}

