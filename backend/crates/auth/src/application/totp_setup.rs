//! TOTP Setup Use Case
//!
//! Enrolment is two-step: `setup` stores a fresh secret, `verify` enables it
//! once the user proves their authenticator produces matching codes.

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entity::{auth::Auth, user::User};
use crate::domain::repository::{AuthRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

pub struct TotpSetupOutput {
    /// QR code as base64-encoded PNG
    pub qr_code_base64: String,
    pub secret: String,
    pub otpauth_url: String,
}

pub struct TotpSetupUseCase<U, A>
where
    U: UserRepository,
    A: AuthRepository,
{
    user_repo: Arc<U>,
    auth_repo: Arc<A>,
}

impl<U, A> TotpSetupUseCase<U, A>
where
    U: UserRepository,
    A: AuthRepository,
{
    pub fn new(user_repo: Arc<U>, auth_repo: Arc<A>) -> Self {
        Self {
            user_repo,
            auth_repo,
        }
    }

    async fn load(&self, user_id: &UserId) -> AuthResult<(User, Auth)> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let auth = self
            .auth_repo
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Auth credentials missing".to_string()))?;
        Ok((user, auth))
    }

    pub async fn is_enabled(&self, user_id: &UserId) -> AuthResult<bool> {
        let (_, auth) = self.load(user_id).await?;
        Ok(auth.requires_2fa())
    }

    pub async fn setup(&self, user_id: &UserId) -> AuthResult<TotpSetupOutput> {
        let (user, mut auth) = self.load(user_id).await?;

        let secret = auth.setup_totp();
        self.auth_repo.update(&auth).await?;

        let account = user.email.as_str();
        let output = TotpSetupOutput {
            qr_code_base64: secret.qr_code_base64(account)?,
            secret: secret.as_base32().to_string(),
            otpauth_url: secret.otpauth_url(account)?,
        };

        tracing::info!(user_id = %user_id, "TOTP setup initiated");
        Ok(output)
    }

    pub async fn verify(&self, user_id: &UserId, code: &str) -> AuthResult<()> {
        let (user, mut auth) = self.load(user_id).await?;

        let secret = auth.totp_secret.as_ref().ok_or(AuthError::TwoFactorNotSetup)?;
        if !secret.verify(code, user.email.as_str())? {
            return Err(AuthError::InvalidTwoFactorCode);
        }

        auth.enable_totp();
        self.auth_repo.update(&auth).await?;

        tracing::info!(user_id = %user_id, "TOTP enabled");
        Ok(())
    }

    /// 現在のコードで確認してから無効化
    pub async fn disable(&self, user_id: &UserId, code: &str) -> AuthResult<()> {
        let (user, mut auth) = self.load(user_id).await?;

        let secret = auth.totp_secret.as_ref().ok_or(AuthError::TwoFactorNotSetup)?;
        if !secret.verify(code, user.email.as_str())? {
            return Err(AuthError::InvalidTwoFactorCode);
        }

        auth.disable_totp();
        self.auth_repo.update(&auth).await?;

        tracing::info!(user_id = %user_id, "TOTP disabled");
        Ok(())
    }
}
