//! Sign In Use Case
//!
//! Verifies email + password (and a TOTP code when two-factor is enabled)
//! and opens a session.

use std::sync::Arc;

use chrono::Duration;

use crate::application::config::AuthConfig;
use crate::application::session_token;
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::{AuthRepository, AuthSessionRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

pub use platform::client::ClientFingerprint;

pub struct SignInInput {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
    pub totp_code: Option<String>,
}

pub enum SignInOutput {
    /// パスワードは正しいが TOTP コードが必要（セッションは未発行）
    TwoFactorRequired,
    SignedIn {
        session_token: String,
        remember_me: bool,
        user: User,
    },
}

pub struct SignInUseCase<U, A, S>
where
    U: UserRepository,
    A: AuthRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    auth_repo: Arc<A>,
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, A, S> SignInUseCase<U, A, S>
where
    U: UserRepository,
    A: AuthRepository,
    S: AuthSessionRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        auth_repo: Arc<A>,
        session_repo: Arc<S>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            auth_repo,
            session_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        fingerprint: ClientFingerprint,
    ) -> AuthResult<SignInOutput> {
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.can_login() {
            return Err(AuthError::AccountDisabled);
        }

        let mut auth = self
            .auth_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Auth credentials missing".to_string()))?;

        if auth.is_locked() {
            return Err(AuthError::AccountLocked);
        }

        let raw_password = RawPassword::for_sign_in(input.password);
        if !auth.password_hash.verify(&raw_password, self.config.pepper()) {
            auth.record_failure();
            self.auth_repo.update(&auth).await?;
            tracing::warn!(
                user_id = %user.user_id,
                failures = auth.login_failed_count,
                locked = auth.is_locked(),
                "Password verification failed"
            );
            return Err(AuthError::InvalidCredentials);
        }

        if auth.requires_2fa() {
            let Some(code) = input.totp_code.as_deref() else {
                return Ok(SignInOutput::TwoFactorRequired);
            };
            let secret = auth
                .totp_secret
                .as_ref()
                .ok_or(AuthError::TwoFactorNotSetup)?;
            if !secret.verify(code, user.email.as_str())? {
                auth.record_failure();
                self.auth_repo.update(&auth).await?;
                return Err(AuthError::InvalidTwoFactorCode);
            }
        }

        auth.reset_failures();
        self.auth_repo.update(&auth).await?;

        user.record_login();
        self.user_repo.update(&user).await?;

        let ttl = Duration::from_std(self.config.session_ttl(input.remember_me))
            .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))?;
        let session = AuthSession::new(
            user.user_id,
            input.remember_me,
            fingerprint.hash_vec(),
            fingerprint.ip_string(),
            fingerprint.user_agent.clone(),
            ttl,
        );
        self.session_repo.create(&session).await?;

        tracing::info!(
            user_id = %user.user_id,
            level = %user.level,
            session_id = %session.session_id,
            remember_me = input.remember_me,
            "User signed in"
        );

        Ok(SignInOutput::SignedIn {
            session_token: session_token::issue(&self.config.session_secret, session.session_id),
            remember_me: input.remember_me,
            user,
        })
    }
}
