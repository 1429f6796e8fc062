//! Shared fixtures for care use case tests

use kernel::id::UserId;
use kernel::scope::{AccessScope, Level, Principal};

use crate::domain::entity::health_center::{HealthCenter, HealthCenterKind};
use crate::domain::repository::HealthCenterRepository;
use crate::infra::memory::MemoryCareRepository;

/// Centre: district office "Centre A" with CSI Mvog-Ada, and CSI Nlongkak in
/// "Centre B". Littoral: Hôpital Laquintinie in "Douala 1".
pub(crate) async fn seed_centers() -> MemoryCareRepository {
    let repo = MemoryCareRepository::new();
    for center in [
        HealthCenter::new(
            "Centre A".into(),
            "Centre".into(),
            HealthCenterKind::District,
            None,
        ),
        HealthCenter::new(
            "CSI Mvog-Ada".into(),
            "Centre".into(),
            HealthCenterKind::Facility,
            Some("Centre A".into()),
        ),
        HealthCenter::new(
            "CSI Nlongkak".into(),
            "Centre".into(),
            HealthCenterKind::Facility,
            Some("Centre B".into()),
        ),
        HealthCenter::new(
            "Hôpital Laquintinie".into(),
            "Littoral".into(),
            HealthCenterKind::Facility,
            Some("Douala 1".into()),
        ),
    ] {
        HealthCenterRepository::create(&repo, &center)
            .await
            .unwrap();
    }
    repo
}

fn principal(level: Level, region: Option<&str>, health_center: Option<&str>) -> Principal {
    Principal {
        user_id: UserId::new(),
        email: format!("{}@vacxcare.org", level.code()),
        level,
        region: region.map(str::to_string),
        health_center: health_center.map(str::to_string),
    }
}

pub(crate) fn national() -> (Principal, AccessScope) {
    (principal(Level::National, None, None), AccessScope::National)
}

pub(crate) fn regional(region: &str) -> (Principal, AccessScope) {
    (
        principal(Level::Regional, Some(region), None),
        AccessScope::Regional {
            region: region.to_string(),
        },
    )
}

pub(crate) fn district(district: &str) -> (Principal, AccessScope) {
    (
        principal(Level::District, Some("Centre"), Some(district)),
        AccessScope::District {
            district: district.to_string(),
        },
    )
}

pub(crate) fn agent_at(health_center: &str) -> (Principal, AccessScope) {
    (
        principal(Level::Agent, Some("Centre"), Some(health_center)),
        AccessScope::Agent {
            health_center: health_center.to_string(),
        },
    )
}
