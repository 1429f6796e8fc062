//! Shared fixtures for stock use case tests

use std::collections::HashMap;

use kernel::id::UserId;
use kernel::scope::{AccessScope, Level, Location, Principal};

/// 施設名から所在地を引く固定表
#[derive(Clone)]
pub(crate) struct MemoryDirectory(HashMap<String, Location>);

impl auth::HealthCenterDirectory for MemoryDirectory {
    async fn locate(&self, health_center: &str) -> auth::AuthResult<Option<Location>> {
        Ok(self.0.get(health_center).cloned())
    }
}

pub(crate) fn directory() -> MemoryDirectory {
    let entries = [
        ("CSI Mvog-Ada", "Centre", "Centre A"),
        ("CSI Nlongkak", "Centre", "Centre B"),
        ("Hôpital Laquintinie", "Littoral", "Douala 1"),
    ];
    MemoryDirectory(
        entries
            .into_iter()
            .map(|(name, region, district)| {
                (
                    name.to_string(),
                    Location::new(
                        Some(region.into()),
                        Some(district.into()),
                        Some(name.into()),
                    ),
                )
            })
            .collect(),
    )
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

pub(crate) fn national_user() -> (Principal, AccessScope) {
    (principal(Level::National, None, None), AccessScope::National)
}

pub(crate) fn regional_user(region: &str) -> (Principal, AccessScope) {
    (
        principal(Level::Regional, Some(region), None),
        AccessScope::Regional {
            region: region.to_string(),
        },
    )
}

pub(crate) fn district_user(district: &str) -> (Principal, AccessScope) {
    (
        principal(Level::District, Some("Centre"), Some(district)),
        AccessScope::District {
            district: district.to_string(),
        },
    )
}

pub(crate) fn agent_user(health_center: &str) -> (Principal, AccessScope) {
    (
        principal(Level::Agent, Some("Centre"), Some(health_center)),
        AccessScope::Agent {
            health_center: health_center.to_string(),
        },
    )
}
