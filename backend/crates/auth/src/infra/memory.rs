//! In-memory repository used by unit tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use kernel::id::UserId;
use kernel::scope::Location;
use listing::{ListQuery, paginate_in_memory};
use uuid::Uuid;

use crate::domain::entity::{auth::Auth, auth_session::AuthSession, user::User};
use crate::domain::repository::{
    AuthRepository, AuthSessionRepository, HealthCenterDirectory, UserRepository,
};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct State {
    users: Vec<User>,
    auths: HashMap<UserId, Auth>,
    sessions: HashMap<Uuid, AuthSession>,
    health_centers: HashMap<String, Location>,
}

#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    state: Arc<Mutex<State>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// 施設の登録（HealthCenterDirectory 用）
    pub fn add_health_center(&self, location: Location) {
        let name = location.health_center.clone().unwrap_or_default();
        self.lock().health_centers.insert(name, location);
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn sessions(&self) -> Vec<AuthSession> {
        self.lock().sessions.values().cloned().collect()
    }
}

impl UserRepository for MemoryAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut state = self.lock();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(AuthError::EmailTaken);
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| &u.user_id == user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| &u.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.lock().users.iter().any(|u| &u.email == email))
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let mut state = self.lock();
        if let Some(stored) = state.users.iter_mut().find(|u| u.user_id == user.user_id) {
            *stored = user.clone();
        }
        Ok(())
    }

    async fn list(&self, query: &ListQuery) -> AuthResult<(Vec<User>, u64)> {
        Ok(paginate_in_memory(&self.lock().users, query))
    }
}

impl AuthRepository for MemoryAuthRepository {
    async fn create(&self, auth: &Auth) -> AuthResult<()> {
        self.lock().auths.insert(auth.user_id, auth.clone());
        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Auth>> {
        Ok(self.lock().auths.get(user_id).cloned())
    }

    async fn update(&self, auth: &Auth) -> AuthResult<()> {
        self.lock().auths.insert(auth.user_id, auth.clone());
        Ok(())
    }
}

impl AuthSessionRepository for MemoryAuthRepository {
    async fn create(&self, session: &AuthSession) -> AuthResult<()> {
        self.lock()
            .sessions
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> AuthResult<Option<AuthSession>> {
        let state = self.lock();
        match state.sessions.get(&session_id) {
            Some(s) if s.is_expired() => Ok(None),
            Some(s) if s.client_fingerprint_hash != fingerprint_hash => {
                Err(AuthError::SessionFingerprintMismatch)
            }
            other => Ok(other.cloned()),
        }
    }

    async fn update(&self, session: &AuthSession) -> AuthResult<()> {
        if let Some(stored) = self.lock().sessions.get_mut(&session.session_id) {
            stored.expires_at_ms = session.expires_at_ms;
            stored.last_activity_at = session.last_activity_at;
        }
        Ok(())
    }

    async fn delete(&self, session_id: Uuid) -> AuthResult<()> {
        self.lock().sessions.remove(&session_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();
        let mut state = self.lock();
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.expires_at_ms >= now_ms);
        Ok((before - state.sessions.len()) as u64)
    }
}

impl HealthCenterDirectory for MemoryAuthRepository {
    async fn locate(&self, health_center: &str) -> AuthResult<Option<Location>> {
        Ok(self.lock().health_centers.get(health_center).cloned())
    }
}
