//! Manage Users Use Case
//!
//! Administrators manage accounts one or more tiers below their own, inside
//! their visibility scope. Agents manage nobody.

use std::sync::Arc;

use kernel::id::UserId;
use kernel::scope::{AccessScope, Level, Location, Principal};
use listing::{Filter, ListQuery, ResourceSchema, ScopeColumns, StatusField, visibility_filter};

use crate::application::config::AuthConfig;
use crate::domain::entity::{auth::Auth, user::User};
use crate::domain::repository::{AuthRepository, HealthCenterDirectory, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
    user_status::UserStatus,
};
use crate::error::{AuthError, AuthResult};

/// ユーザー一覧の定義
pub const USER_SCHEMA: ResourceSchema = ResourceSchema {
    sortable: &[
        ("createdAt", "created_at"),
        ("email", "email"),
        ("name", "name"),
        ("role", "role"),
        ("lastLoginAt", "last_login_at"),
    ],
    default_sort: "createdAt",
    searchable: &["email", "name", "health_center"],
    date_column: Some("created_at"),
    status: Some(StatusField {
        column: "status",
        allowed: &["active", "disabled"],
    }),
};

const USER_COLUMNS: ScopeColumns = ScopeColumns {
    region: "region",
    district: "district",
    health_center: "health_center",
};

pub struct CreateUserInput {
    pub email: String,
    pub name: String,
    pub password: String,
    pub level: Level,
    pub region: Option<String>,
    pub health_center: Option<String>,
}

pub struct ManageUsersUseCase<U, A, D>
where
    U: UserRepository,
    A: AuthRepository,
    D: HealthCenterDirectory,
{
    user_repo: Arc<U>,
    auth_repo: Arc<A>,
    directory: Arc<D>,
    config: Arc<AuthConfig>,
}

impl<U, A, D> ManageUsersUseCase<U, A, D>
where
    U: UserRepository,
    A: AuthRepository,
    D: HealthCenterDirectory,
{
    pub fn new(
        user_repo: Arc<U>,
        auth_repo: Arc<A>,
        directory: Arc<D>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            auth_repo,
            directory,
            config,
        }
    }

    /// 管理可能なユーザーのみを一覧
    pub async fn list(
        &self,
        caller: &Principal,
        scope: &AccessScope,
        query: ListQuery,
    ) -> AuthResult<(Vec<User>, u64)> {
        let lower = managed_levels(caller.level)?;
        let query = query
            .restrict(visibility_filter(scope, &USER_COLUMNS))
            .restrict(Filter::any(
                lower.into_iter().map(|level| Filter::eq("role", level.code())),
            ));
        self.user_repo.list(&query).await
    }

    pub async fn create(
        &self,
        caller: &Principal,
        scope: &AccessScope,
        input: CreateUserInput,
    ) -> AuthResult<User> {
        if !caller.level.is_above(input.level) {
            return Err(AuthError::Forbidden(
                "You can only create users of a lower level",
            ));
        }

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AuthError::InvalidInput("name is required".to_string()));
        }

        let email = Email::new(&input.email)
            .map_err(|e| AuthError::InvalidInput(e.message().to_string()))?;
        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let raw_password = RawPassword::new(input.password)?;
        let location = self.resolve_location(input.level, input.region, input.health_center).await?;

        if !scope.covers(&location) {
            return Err(AuthError::Forbidden(
                "The new user must be inside your area",
            ));
        }

        let user = User::new(email, name, input.level, location);
        let auth = Auth::new(
            user.user_id,
            UserPassword::from_raw(&raw_password, self.config.pepper())?,
        );

        self.user_repo.create(&user).await?;
        self.auth_repo.create(&auth).await?;

        tracing::info!(
            user_id = %user.user_id,
            level = %user.level,
            created_by = %caller.user_id,
            "User created"
        );
        Ok(user)
    }

    /// 有効化・無効化
    pub async fn set_status(
        &self,
        caller: &Principal,
        scope: &AccessScope,
        user_id: &UserId,
        status: UserStatus,
    ) -> AuthResult<User> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        // Users outside the caller's area look absent.
        if !scope.covers(&user.location) {
            return Err(AuthError::UserNotFound);
        }
        if !caller.level.is_above(user.level) {
            return Err(AuthError::Forbidden(
                "You can only manage users of a lower level",
            ));
        }

        if user.status != status {
            user.set_status(status);
            self.user_repo.update(&user).await?;
            tracing::info!(
                user_id = %user.user_id,
                status = %status,
                changed_by = %caller.user_id,
                "User status changed"
            );
        }
        Ok(user)
    }

    /// 階層に必要な所在地を組み立てる
    ///
    /// district / agent は施設名から region と district を引きます。
    async fn resolve_location(
        &self,
        level: Level,
        region: Option<String>,
        health_center: Option<String>,
    ) -> AuthResult<Location> {
        let region = region.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        let health_center = health_center
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());

        match level {
            Level::National => Ok(Location::default()),
            Level::Regional => {
                let region = region.ok_or_else(|| {
                    AuthError::InvalidInput("region is required for regional users".to_string())
                })?;
                Ok(Location::new(Some(region), None, None))
            }
            Level::District | Level::Agent => {
                let name = health_center.ok_or_else(|| {
                    AuthError::InvalidInput(format!(
                        "healthCenter is required for {level} users"
                    ))
                })?;
                self.directory
                    .locate(&name)
                    .await?
                    .ok_or(AuthError::UnknownHealthCenter(name))
            }
        }
    }
}

/// 呼び出し元が管理できる階層
fn managed_levels(level: Level) -> AuthResult<Vec<Level>> {
    let lower: Vec<Level> = Level::ALL
        .into_iter()
        .filter(|other| level.is_above(*other))
        .collect();
    if lower.is_empty() {
        return Err(AuthError::Forbidden("Agents cannot manage users"));
    }
    Ok(lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{centre_a_agent_location, seed_user};
    use crate::infra::memory::MemoryAuthRepository;
    use listing::RawListQuery;

    type UseCase =
        ManageUsersUseCase<MemoryAuthRepository, MemoryAuthRepository, MemoryAuthRepository>;

    fn use_case(repo: &MemoryAuthRepository) -> UseCase {
        let shared = Arc::new(repo.clone());
        ManageUsersUseCase::new(
            shared.clone(),
            shared.clone(),
            shared,
            Arc::new(AuthConfig::development()),
        )
    }

    fn repo_with_centers() -> MemoryAuthRepository {
        let repo = MemoryAuthRepository::new();
        repo.add_health_center(centre_a_agent_location());
        repo.add_health_center(Location::new(
            Some("Centre".into()),
            Some("Centre B".into()),
            Some("CSI Nlongkak".into()),
        ));
        repo.add_health_center(Location::new(
            Some("Littoral".into()),
            Some("Douala 1".into()),
            Some("CSI Bonanjo".into()),
        ));
        repo
    }

    fn district_a() -> (Principal, AccessScope) {
        let principal = Principal {
            user_id: UserId::new(),
            email: "district@vacxcare.org".into(),
            level: Level::District,
            region: Some("Centre".into()),
            health_center: Some("Centre A".into()),
        };
        let scope = AccessScope::District {
            district: "Centre A".into(),
        };
        (principal, scope)
    }

    fn agent_input(email: &str, health_center: &str) -> CreateUserInput {
        CreateUserInput {
            email: email.into(),
            name: "Agent".into(),
            password: "Vaccins-2024-Centre".into(),
            level: Level::Agent,
            region: None,
            health_center: Some(health_center.into()),
        }
    }

    #[tokio::test]
    async fn test_district_creates_agent_in_its_district() {
        let repo = repo_with_centers();
        let (caller, scope) = district_a();

        let user = use_case(&repo)
            .create(&caller, &scope, agent_input("new@vacxcare.org", "CSI Mvog-Ada"))
            .await
            .unwrap();
        assert_eq!(user.location.district.as_deref(), Some("Centre A"));
        assert_eq!(user.location.region.as_deref(), Some("Centre"));
        assert!(
            AuthRepository::find_by_user_id(&repo, &user.user_id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_create_outside_scope_or_same_level_is_forbidden() {
        let repo = repo_with_centers();
        let (caller, scope) = district_a();
        let uc = use_case(&repo);

        let other_district = uc
            .create(&caller, &scope, agent_input("b@vacxcare.org", "CSI Nlongkak"))
            .await;
        assert!(matches!(other_district, Err(AuthError::Forbidden(_))));

        let peer = uc
            .create(
                &caller,
                &scope,
                CreateUserInput {
                    level: Level::District,
                    ..agent_input("peer@vacxcare.org", "CSI Mvog-Ada")
                },
            )
            .await;
        assert!(matches!(peer, Err(AuthError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_and_unknown_center() {
        let repo = repo_with_centers();
        let (caller, scope) = district_a();
        let uc = use_case(&repo);
        seed_user(
            &repo,
            "taken@vacxcare.org",
            "Vaccins-2024-Centre",
            Level::Agent,
            centre_a_agent_location(),
        )
        .await;

        let dup = uc
            .create(&caller, &scope, agent_input("TAKEN@vacxcare.org", "CSI Mvog-Ada"))
            .await;
        assert!(matches!(dup, Err(AuthError::EmailTaken)));

        let unknown = uc
            .create(&caller, &scope, agent_input("x@vacxcare.org", "CSI Inconnu"))
            .await;
        assert!(matches!(unknown, Err(AuthError::UnknownHealthCenter(_))));
    }

    #[tokio::test]
    async fn test_list_only_returns_lower_levels_in_scope() {
        let repo = repo_with_centers();
        let (caller, scope) = district_a();
        seed_user(
            &repo,
            "a@vacxcare.org",
            "Vaccins-2024-Centre",
            Level::Agent,
            centre_a_agent_location(),
        )
        .await;
        seed_user(
            &repo,
            "peer@vacxcare.org",
            "Vaccins-2024-Centre",
            Level::District,
            centre_a_agent_location(),
        )
        .await;
        seed_user(
            &repo,
            "b@vacxcare.org",
            "Vaccins-2024-Centre",
            Level::Agent,
            Location::new(
                Some("Centre".into()),
                Some("Centre B".into()),
                Some("CSI Nlongkak".into()),
            ),
        )
        .await;

        let query = ListQuery::parse(&RawListQuery::default(), &USER_SCHEMA).unwrap();
        let (users, total) = use_case(&repo).list(&caller, &scope, query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(users[0].email.as_str(), "a@vacxcare.org");
    }

    #[tokio::test]
    async fn test_agents_cannot_list_users() {
        let repo = repo_with_centers();
        let caller = Principal {
            level: Level::Agent,
            ..district_a().0
        };
        let scope = AccessScope::Agent {
            health_center: "CSI Mvog-Ada".into(),
        };
        let result = use_case(&repo)
            .list(&caller, &scope, ListQuery::default())
            .await;
        assert!(matches!(result, Err(AuthError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_deactivate_user() {
        let repo = repo_with_centers();
        let (caller, scope) = district_a();
        let agent = seed_user(
            &repo,
            "a@vacxcare.org",
            "Vaccins-2024-Centre",
            Level::Agent,
            centre_a_agent_location(),
        )
        .await;
        let uc = use_case(&repo);

        let user = uc
            .set_status(&caller, &scope, &agent.user_id, UserStatus::Disabled)
            .await
            .unwrap();
        assert!(!user.can_login());

        let other_scope = AccessScope::District {
            district: "Centre B".into(),
        };
        let hidden = uc
            .set_status(&caller, &other_scope, &agent.user_id, UserStatus::Active)
            .await;
        assert!(matches!(hidden, Err(AuthError::UserNotFound)));
    }
}
