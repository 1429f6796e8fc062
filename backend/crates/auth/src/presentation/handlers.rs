//! HTTP Handlers

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use kernel::id::UserId;
use kernel::scope::{AccessScope, Principal};
use listing::{ListQuery, Paginated, RawListQuery};
use std::sync::Arc;

use platform::client::ClientFingerprint;

use crate::application::config::AuthConfig;
use crate::application::{
    CheckSessionUseCase, CreateUserInput, ManageUsersUseCase, SignInInput, SignInOutput,
    SignInUseCase, SignOutUseCase, TotpSetupUseCase, USER_SCHEMA,
};
use crate::domain::repository::{
    AuthRepository, AuthSessionRepository, HealthCenterDirectory, UserRepository,
};
use crate::domain::value_object::user_status::UserStatus;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    CreateUserRequest, MeResponse, SessionStatusResponse, SignInRequest, SignInResponse,
    TotpCodeRequest, TotpSetupResponse, UserResponse,
};

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: UserRepository + AuthRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<R>(
    State(state): State<AuthAppState<R>>,
    fingerprint: ClientFingerprint,
    Json(req): Json<SignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + AuthRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let input = SignInInput {
        email: req.email,
        password: req.password,
        remember_me: req.remember_me,
        totp_code: req.totp_code,
    };

    match use_case.execute(input, fingerprint).await? {
        // No cookie until the second factor is supplied
        SignInOutput::TwoFactorRequired => Ok((
            StatusCode::OK,
            Json(SignInResponse {
                requires_two_factor: true,
                user: None,
            }),
        )
            .into_response()),
        SignInOutput::SignedIn {
            session_token,
            remember_me,
            user,
        } => {
            let max_age = state.config.session_ttl(remember_me).as_secs();
            let cookie = state.config.cookie().build_set_cookie(&session_token, max_age);

            Ok((
                StatusCode::OK,
                [(header::SET_COOKIE, cookie)],
                Json(SignInResponse {
                    requires_two_factor: false,
                    user: Some(UserResponse::from(user)),
                }),
            )
                .into_response())
        }
    }
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/auth/signout
pub async fn sign_out<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: UserRepository + AuthRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    if let Some(token) = platform::cookie::extract_cookie(&headers, &state.config.session_cookie_name)
    {
        let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
        // The cookie is cleared either way.
        if let Err(e) = use_case.execute(&token).await {
            tracing::debug!(error = %e, "Sign out with an unusable session token");
        }
    }

    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.config.cookie().build_delete_cookie())],
    )
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/auth/status
pub async fn session_status<R>(
    State(state): State<AuthAppState<R>>,
    fingerprint: ClientFingerprint,
    headers: HeaderMap,
) -> Json<SessionStatusResponse>
where
    R: UserRepository + AuthRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    let token = platform::cookie::extract_cookie(&headers, &state.config.session_cookie_name);

    let authenticated = match token {
        Some(token) => {
            let use_case =
                CheckSessionUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());
            use_case.execute(&token, &fingerprint.hash).await.ok()
        }
        None => None,
    };

    Json(match authenticated {
        Some(auth) => SessionStatusResponse {
            authenticated: true,
            user: Some(UserResponse::from(&auth.user)),
            expires_at_ms: Some(auth.session.expires_at_ms),
        },
        None => SessionStatusResponse {
            authenticated: false,
            user: None,
            expires_at_ms: None,
        },
    })
}

// ============================================================================
// Current user (requires authentication)
// ============================================================================

/// GET /api/auth/me
pub async fn me<R>(
    State(state): State<AuthAppState<R>>,
    Extension(principal): Extension<Principal>,
) -> AuthResult<Json<MeResponse>>
where
    R: UserRepository + AuthRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    let user = UserRepository::find_by_id(state.repo.as_ref(), &principal.user_id)
        .await?
        .ok_or(AuthError::SessionInvalid)?;
    let totp_enabled = TotpSetupUseCase::new(state.repo.clone(), state.repo.clone())
        .is_enabled(&principal.user_id)
        .await?;

    Ok(Json(MeResponse {
        user: UserResponse::from(user),
        totp_enabled,
    }))
}

// ============================================================================
// TOTP Setup (requires authentication)
// ============================================================================

/// POST /api/auth/totp/setup
pub async fn totp_setup<R>(
    State(state): State<AuthAppState<R>>,
    Extension(principal): Extension<Principal>,
) -> AuthResult<Json<TotpSetupResponse>>
where
    R: UserRepository + AuthRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    let use_case = TotpSetupUseCase::new(state.repo.clone(), state.repo.clone());
    let output = use_case.setup(&principal.user_id).await?;

    Ok(Json(TotpSetupResponse {
        qr_code: output.qr_code_base64,
        secret: output.secret,
        otpauth_url: output.otpauth_url,
    }))
}

/// POST /api/auth/totp/verify
pub async fn totp_verify<R>(
    State(state): State<AuthAppState<R>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<TotpCodeRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + AuthRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    TotpSetupUseCase::new(state.repo.clone(), state.repo.clone())
        .verify(&principal.user_id, &req.code)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/totp/disable
pub async fn totp_disable<R>(
    State(state): State<AuthAppState<R>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<TotpCodeRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + AuthRepository + AuthSessionRepository + Clone + Send + Sync + 'static,
{
    TotpSetupUseCase::new(state.repo.clone(), state.repo.clone())
        .disable(&principal.user_id, &req.code)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// User administration
// ============================================================================

/// Shared state for user administration handlers
#[derive(Clone)]
pub struct UsersAppState<R, D>
where
    R: UserRepository + AuthRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub directory: Arc<D>,
    pub config: Arc<AuthConfig>,
}

impl<R, D> UsersAppState<R, D>
where
    R: UserRepository + AuthRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    fn use_case(&self) -> ManageUsersUseCase<R, R, D> {
        ManageUsersUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.directory.clone(),
            self.config.clone(),
        )
    }
}

/// GET /api/users
pub async fn list_users<R, D>(
    State(state): State<UsersAppState<R, D>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Query(raw): Query<RawListQuery>,
) -> AuthResult<Json<Paginated<UserResponse>>>
where
    R: UserRepository + AuthRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    let query = ListQuery::parse(&raw, &USER_SCHEMA)?;
    let (users, total) = state.use_case().list(&principal, &scope, query.clone()).await?;

    Ok(Json(
        Paginated::new(users, &query, total).map(UserResponse::from),
    ))
}

/// POST /api/users
pub async fn create_user<R, D>(
    State(state): State<UsersAppState<R, D>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Json(req): Json<CreateUserRequest>,
) -> AuthResult<(StatusCode, Json<UserResponse>)>
where
    R: UserRepository + AuthRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    let input = CreateUserInput {
        email: req.email,
        name: req.name,
        password: req.password,
        level: req.role,
        region: req.region,
        health_center: req.health_center,
    };
    let user = state.use_case().create(&principal, &scope, input).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /api/users/{id}/activate
pub async fn activate_user<R, D>(
    State(state): State<UsersAppState<R, D>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Path(user_id): Path<UserId>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + AuthRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    let user = state
        .use_case()
        .set_status(&principal, &scope, &user_id, UserStatus::Active)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// POST /api/users/{id}/deactivate
pub async fn deactivate_user<R, D>(
    State(state): State<UsersAppState<R, D>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Path(user_id): Path<UserId>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + AuthRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    if user_id == principal.user_id {
        return Err(AuthError::Forbidden("You cannot deactivate your own account"));
    }
    let user = state
        .use_case()
        .set_status(&principal, &scope, &user_id, UserStatus::Disabled)
        .await?;
    Ok(Json(UserResponse::from(user)))
}
