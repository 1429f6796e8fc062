//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Email + password sign-in with an HttpOnly session cookie
//! - TOTP-based 2FA (Google Authenticator compatible)
//! - Administrative tiers (national, regional, district, agent)
//! - User administration limited to lower tiers inside the caller's area
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (optional pepper)
//! - Session ids signed with HMAC-SHA256 and bound to the client User-Agent
//! - Automatic lockout after repeated failed logins
//! - Disabled accounts lose access immediately, including live sessions

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use domain::repository::{HealthCenterDirectory, LocalHealthCenterDirectory};
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::middleware::{AuthMiddlewareState, CurrentSession, require_auth_session};
pub use presentation::router::{auth_router, users_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
