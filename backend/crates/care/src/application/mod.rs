//! Application Layer
//!
//! Use cases for health centers, the vaccine catalogue, children,
//! vaccinations and dashboards. Every read and write is bounded by the
//! caller's `AccessScope`.

pub mod backfill;
pub mod children;
pub mod dashboard;
pub mod health_centers;
pub mod resolve_scope;
pub mod vaccinations;
pub mod vaccines;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use backfill::BackfillDistrictsUseCase;
pub use children::{CHILD_SCHEMA, ChildrenUseCase, RECORD_COLUMNS, RegisterChildInput};
pub use dashboard::{DashboardSummary, DashboardUseCase, GroupCount, MonthCount, StatusCounts};
pub use health_centers::{
    CreateHealthCenterInput, HEALTH_CENTER_COLUMNS, HEALTH_CENTER_SCHEMA, HealthCentersUseCase,
};
pub use resolve_scope::ResolveScopeUseCase;
pub use vaccinations::{
    RecordVaccinationInput, UpdateVaccinationInput, VACCINATION_SCHEMA, VaccinationsUseCase,
};
pub use vaccines::VaccineCatalogueUseCase;
