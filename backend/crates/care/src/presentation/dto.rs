//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::{ChildId, HealthCenterId, VaccinationId, VaccineId};
use serde::{Deserialize, Serialize};

use crate::domain::entity::{
    child::{Child, CoverageStatus},
    health_center::{HealthCenter, HealthCenterKind},
    vaccination::{DoseStatus, Vaccination},
};

// ============================================================================
// Health centers
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCenterResponse {
    pub id: HealthCenterId,
    pub name: String,
    pub region: String,
    #[serde(rename = "type")]
    pub kind: HealthCenterKind,
    pub district_name: Option<String>,
    /// 解決済みの district
    pub district: String,
    pub created_at: DateTime<Utc>,
}

impl From<HealthCenter> for HealthCenterResponse {
    fn from(center: HealthCenter) -> Self {
        Self {
            district: center.district().to_string(),
            id: center.id,
            name: center.name,
            region: center.region,
            kind: center.kind,
            district_name: center.district_name,
            created_at: center.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHealthCenterRequest {
    pub name: String,
    pub region: String,
    #[serde(rename = "type", default)]
    pub kind: HealthCenterKind,
    pub district_name: Option<String>,
}

// ============================================================================
// Children
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildResponse {
    pub id: ChildId,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Option<String>,
    pub parent_name: String,
    pub parent_phone: String,
    pub region: Option<String>,
    pub district: Option<String>,
    pub health_center: Option<String>,
    pub vaccination_status: CoverageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Child> for ChildResponse {
    fn from(child: Child) -> Self {
        Self {
            id: child.id,
            name: child.name,
            birth_date: child.birth_date,
            gender: child.gender,
            parent_name: child.parent_name,
            parent_phone: child.parent_phone,
            region: child.location.region,
            district: child.location.district,
            health_center: child.location.health_center,
            vaccination_status: child.vaccination_status,
            created_at: child.created_at,
            updated_at: child.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChildRequest {
    pub name: String,
    /// `YYYY-MM-DD`
    pub birth_date: NaiveDate,
    pub gender: Option<String>,
    pub parent_name: String,
    pub parent_phone: String,
    pub health_center: String,
}

// ============================================================================
// Vaccinations
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationResponse {
    pub id: VaccinationId,
    pub child_id: ChildId,
    pub child_name: String,
    pub vaccine_id: VaccineId,
    pub vaccine_name: String,
    pub date: NaiveDate,
    pub dose_number: i32,
    pub status: DoseStatus,
    pub region: Option<String>,
    pub district: Option<String>,
    pub health_center: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Vaccination> for VaccinationResponse {
    fn from(v: Vaccination) -> Self {
        Self {
            id: v.id,
            child_id: v.child_id,
            child_name: v.child_name,
            vaccine_id: v.vaccine_id,
            vaccine_name: v.vaccine_name,
            date: v.date,
            dose_number: v.dose_number,
            status: v.status,
            region: v.location.region,
            district: v.location.district,
            health_center: v.location.health_center,
            created_at: v.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVaccinationRequest {
    pub child_id: ChildId,
    pub vaccine_id: VaccineId,
    pub date: NaiveDate,
    #[serde(default = "first_dose")]
    pub dose_number: i32,
    /// 省略時は completed
    pub status: Option<DoseStatus>,
    pub health_center: Option<String>,
}

fn first_dose() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVaccinationRequest {
    pub status: DoseStatus,
    /// 実施日（省略時は元の日付）
    pub date: Option<NaiveDate>,
}
