//! Application Layer
//!
//! Use cases and application services.

pub mod check_session;
pub mod config;
pub mod manage_users;
pub mod session_token;
pub mod sign_in;
pub mod sign_out;
pub mod totp_setup;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use check_session::{Authenticated, CheckSessionUseCase};
pub use config::AuthConfig;
pub use manage_users::{CreateUserInput, ManageUsersUseCase, USER_SCHEMA};
pub use sign_in::{ClientFingerprint, SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use totp_setup::{TotpSetupOutput, TotpSetupUseCase};
