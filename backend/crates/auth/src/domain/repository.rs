//! Repository Traits
//!
//! Persistence interfaces; implementations live in `infra`.

use kernel::id::UserId;
use kernel::scope::Location;
use listing::ListQuery;
use uuid::Uuid;

use crate::domain::entity::{auth::Auth, auth_session::AuthSession, user::User};
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    async fn update(&self, user: &User) -> AuthResult<()>;

    /// 絞り込み済みの一覧と総件数
    async fn list(&self, query: &ListQuery) -> AuthResult<(Vec<User>, u64)>;
}

#[trait_variant::make(AuthRepository: Send)]
pub trait LocalAuthRepository {
    async fn create(&self, auth: &Auth) -> AuthResult<()>;

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Auth>>;

    async fn update(&self, auth: &Auth) -> AuthResult<()>;
}

#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    async fn create(&self, session: &AuthSession) -> AuthResult<()>;

    /// 期限内のセッションを取得し、指紋を照合する
    async fn find_by_id(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> AuthResult<Option<AuthSession>>;

    /// 最終アクティビティと有効期限の更新
    async fn update(&self, session: &AuthSession) -> AuthResult<()>;

    async fn delete(&self, session_id: Uuid) -> AuthResult<()>;

    async fn cleanup_expired(&self) -> AuthResult<u64>;
}

/// 施設名から所在地を引く（ユーザー作成時の所属解決）
///
/// 施設データは care クレートが持つため、実装はそちらで提供されます。
#[trait_variant::make(HealthCenterDirectory: Send)]
pub trait LocalHealthCenterDirectory {
    async fn locate(&self, health_center: &str) -> AuthResult<Option<Location>>;
}
