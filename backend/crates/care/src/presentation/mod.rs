//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and the scope middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::CareAppState;
pub use middleware::{ScopeMiddlewareState, resolve_access_scope};
pub use router::care_router;
