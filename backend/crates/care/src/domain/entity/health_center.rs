//! Health Center Entity
//!
//! A facility, or a district office that is itself a health center. The
//! district of every record is derived from the health center it belongs to.

use chrono::{DateTime, Utc};
use derive_more::Display;
use kernel::id::HealthCenterId;
use kernel::scope::Location;
use listing::{FieldValue, Filterable};
use serde::{Deserialize, Serialize};

/// 施設の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCenterKind {
    #[default]
    #[display("facility")]
    Facility,
    /// 施設名がそのまま district 名になる
    #[display("district")]
    District,
}

impl HealthCenterKind {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Facility => "facility",
            Self::District => "district",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "facility" => Some(Self::Facility),
            "district" => Some(Self::District),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthCenter {
    pub id: HealthCenterId,
    /// 一意な施設名
    pub name: String,
    pub region: String,
    pub kind: HealthCenterKind,
    /// 親 district（facility のみ）
    pub district_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl HealthCenter {
    pub fn new(
        name: String,
        region: String,
        kind: HealthCenterKind,
        district_name: Option<String>,
    ) -> Self {
        Self {
            id: HealthCenterId::new(),
            name,
            region,
            kind,
            district_name: match kind {
                HealthCenterKind::District => None,
                HealthCenterKind::Facility => district_name,
            },
            created_at: Utc::now(),
        }
    }

    /// 所属 district
    ///
    /// district 型はその名前、facility は親 district 名。どちらも無ければ
    /// 施設名そのものを district として扱います。
    pub fn district(&self) -> &str {
        match self.kind {
            HealthCenterKind::District => &self.name,
            HealthCenterKind::Facility => self.district_name.as_deref().unwrap_or(&self.name),
        }
    }

    /// この施設に属するレコードの所在地
    pub fn location(&self) -> Location {
        Location::new(
            Some(self.region.clone()),
            Some(self.district().to_string()),
            Some(self.name.clone()),
        )
    }
}

impl Filterable for HealthCenter {
    fn field(&self, column: &str) -> FieldValue<'_> {
        match column {
            "name" => FieldValue::text(&self.name),
            "region" => FieldValue::text(&self.region),
            "district" => FieldValue::text(self.district()),
            "kind" => FieldValue::text(self.kind.code()),
            "created_at" => FieldValue::Timestamp(self.created_at),
            _ => FieldValue::Missing,
        }
    }
}
