//! Domain Layer
//!
//! Health centers, the vaccine catalogue, children and their vaccinations.

pub mod entity;
pub mod repository;

pub use entity::{
    child::{Child, CoverageStatus},
    health_center::{HealthCenter, HealthCenterKind},
    vaccination::{DoseStatus, Vaccination},
    vaccine::Vaccine,
};
pub use repository::{
    BackfillReport, CareStore, ChildRepository, DashboardRepository, DistrictBackfill,
    HealthCenterRepository, PendingTransferCounter, VaccinationRepository, VaccineRepository,
};
