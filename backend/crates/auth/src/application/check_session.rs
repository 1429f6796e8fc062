//! Check Session Use Case
//!
//! Resolves a session cookie into the signed-in user.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session_token;
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

/// 検証済みセッションとその利用者
pub struct Authenticated {
    pub session: AuthSession,
    pub user: User,
}

pub struct CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, S> CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    /// セッションを検証し、アクティブな利用者を返す
    ///
    /// 無効化されたアカウントは既存セッションでも拒否します。
    pub async fn execute(
        &self,
        session_token: &str,
        fingerprint_hash: &[u8],
    ) -> AuthResult<Authenticated> {
        let session = self.get_session(session_token, fingerprint_hash).await?;

        let user = self
            .user_repo
            .find_by_id(&session.user_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if !user.can_login() {
            return Err(AuthError::AccountDisabled);
        }

        Ok(Authenticated { session, user })
    }

    async fn get_session(
        &self,
        session_token: &str,
        fingerprint_hash: &[u8],
    ) -> AuthResult<AuthSession> {
        let session_id = session_token::parse(&self.config.session_secret, session_token)?;

        let mut session = self
            .session_repo
            .find_by_id(session_id, fingerprint_hash)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if session.is_expired() {
            self.session_repo.delete(session_id).await?;
            return Err(AuthError::SessionInvalid);
        }

        session.touch();
        let ttl_long = chrono::Duration::from_std(self.config.session_ttl_long)
            .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))?;
        session.extend_if_needed(ttl_long);

        // Activity update is best-effort.
        let snapshot = session.clone();
        let repo = self.session_repo.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.update(&snapshot).await {
                tracing::warn!(error = %e, "Failed to update session activity");
            }
        });

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sign_in::{SignInInput, SignInOutput, SignInUseCase};
    use crate::application::test_support::{centre_a_agent_location, fingerprint, seed_user};
    use crate::domain::value_object::user_status::UserStatus;
    use crate::infra::memory::MemoryAuthRepository;
    use kernel::scope::Level;
    use platform::crypto::sha256;

    const PASSWORD: &str = "Mvog-Ada-vaccins";

    async fn signed_in(repo: &MemoryAuthRepository, config: &Arc<AuthConfig>) -> (String, User) {
        let user = seed_user(
            repo,
            "agent@vacxcare.org",
            PASSWORD,
            Level::Agent,
            centre_a_agent_location(),
        )
        .await;
        let shared = Arc::new(repo.clone());
        let output = SignInUseCase::new(shared.clone(), shared.clone(), shared, config.clone())
            .execute(
                SignInInput {
                    email: "agent@vacxcare.org".into(),
                    password: PASSWORD.into(),
                    remember_me: false,
                    totp_code: None,
                },
                fingerprint(),
            )
            .await
            .unwrap();
        match output {
            SignInOutput::SignedIn { session_token, .. } => (session_token, user),
            SignInOutput::TwoFactorRequired => panic!("unexpected 2FA"),
        }
    }

    fn check(
        repo: &MemoryAuthRepository,
        config: &Arc<AuthConfig>,
    ) -> CheckSessionUseCase<MemoryAuthRepository, MemoryAuthRepository> {
        let shared = Arc::new(repo.clone());
        CheckSessionUseCase::new(shared.clone(), shared, config.clone())
    }

    #[tokio::test]
    async fn test_valid_session_yields_principal() {
        let repo = MemoryAuthRepository::new();
        let config = Arc::new(AuthConfig::development());
        let (token, user) = signed_in(&repo, &config).await;

        let auth = check(&repo, &config)
            .execute(&token, &fingerprint().hash)
            .await
            .unwrap();
        let principal = auth.user.principal();
        assert_eq!(principal.user_id, user.user_id);
        assert_eq!(principal.level, Level::Agent);
        assert_eq!(principal.health_center.as_deref(), Some("CSI Mvog-Ada"));
    }

    #[tokio::test]
    async fn test_other_browser_is_rejected() {
        let repo = MemoryAuthRepository::new();
        let config = Arc::new(AuthConfig::development());
        let (token, _) = signed_in(&repo, &config).await;

        let result = check(&repo, &config)
            .execute(&token, &sha256(b"curl/8.0"))
            .await;
        assert!(matches!(result, Err(AuthError::SessionFingerprintMismatch)));
    }

    #[tokio::test]
    async fn test_disabling_a_user_kills_live_sessions() {
        let repo = MemoryAuthRepository::new();
        let config = Arc::new(AuthConfig::development());
        let (token, mut user) = signed_in(&repo, &config).await;

        user.set_status(UserStatus::Disabled);
        UserRepository::update(&repo, &user).await.unwrap();

        let result = check(&repo, &config).execute(&token, &fingerprint().hash).await;
        assert!(matches!(result, Err(AuthError::AccountDisabled)));
    }

    #[tokio::test]
    async fn test_token_signed_with_another_secret_is_rejected() {
        let repo = MemoryAuthRepository::new();
        let config = Arc::new(AuthConfig::development());
        let (token, _) = signed_in(&repo, &config).await;

        let other = Arc::new(AuthConfig::development());
        let result = check(&repo, &other).execute(&token, &fingerprint().hash).await;
        assert!(matches!(result, Err(AuthError::SessionInvalid)));
    }
}
