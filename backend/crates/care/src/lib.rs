//! Care Backend Module
//!
//! Health centers, the vaccine catalogue, children and vaccinations, plus
//! the dashboards built on top of them.
//!
//! ## Visibility
//! Every record carries a region, a district and a health center. The
//! district is never typed in: it is derived from the health center when the
//! record is written. A caller only sees records inside the `AccessScope`
//! resolved from their tier (national, regional, district, agent), and
//! records outside that scope answer 404 rather than 403.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities and repository traits
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL implementation
//! - `presentation/` - HTTP handlers, DTOs, router, scope middleware

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::{BackfillDistrictsUseCase, DashboardSummary, ResolveScopeUseCase};
pub use domain::repository::{
    BackfillReport, CareStore, DistrictBackfill, LocalPendingTransferCounter,
    PendingTransferCounter,
};
pub use error::{CareError, CareResult};
pub use infra::postgres::PgCareRepository;
pub use presentation::{ScopeMiddlewareState, care_router, resolve_access_scope};
