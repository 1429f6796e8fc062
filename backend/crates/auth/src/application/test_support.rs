//! Fixtures shared by the use-case tests

use kernel::scope::{Level, Location};
use platform::client::ClientFingerprint;
use platform::crypto::sha256;

use crate::domain::entity::{auth::Auth, user::User};
use crate::domain::repository::{AuthRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::infra::memory::MemoryAuthRepository;

pub const USER_AGENT: &str = "Mozilla/5.0 (VacXCare test)";

pub fn fingerprint() -> ClientFingerprint {
    ClientFingerprint {
        hash: sha256(USER_AGENT.as_bytes()),
        ip: None,
        user_agent: Some(USER_AGENT.to_string()),
    }
}

pub async fn seed_user(
    repo: &MemoryAuthRepository,
    email: &str,
    password: &str,
    level: Level,
    location: Location,
) -> User {
    let user = User::new(
        Email::new(email).unwrap(),
        email.split('@').next().unwrap_or_default().to_string(),
        level,
        location,
    );
    let raw = RawPassword::new(password.to_string()).unwrap();
    let auth = Auth::new(user.user_id, UserPassword::from_raw(&raw, None).unwrap());
    UserRepository::create(repo, &user).await.unwrap();
    AuthRepository::create(repo, &auth).await.unwrap();
    user
}

pub fn centre_a_agent_location() -> Location {
    Location::new(
        Some("Centre".into()),
        Some("Centre A".into()),
        Some("CSI Mvog-Ada".into()),
    )
}
