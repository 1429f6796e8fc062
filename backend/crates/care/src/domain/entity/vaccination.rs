//! Vaccination Entity

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use kernel::id::{ChildId, VaccinationId, VaccineId};
use kernel::scope::Location;
use listing::{FieldValue, Filterable};
use serde::{Deserialize, Serialize};

/// 接種記録の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    #[display("scheduled")]
    Scheduled,
    #[default]
    #[display("completed")]
    Completed,
    #[display("missed")]
    Missed,
    #[display("cancelled")]
    Cancelled,
}

impl DoseStatus {
    pub const CODES: &'static [&'static str] = &["scheduled", "completed", "missed", "cancelled"];

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Missed => "missed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "missed" => Some(Self::Missed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// completed / cancelled はそれ以上変わらない
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// scheduled → completed / missed / cancelled、missed → completed / cancelled
    pub fn can_transition_to(&self, target: DoseStatus) -> bool {
        matches!(
            (self, target),
            (Self::Scheduled, Self::Completed | Self::Missed | Self::Cancelled)
                | (Self::Missed, Self::Completed | Self::Cancelled)
        )
    }
}

#[derive(Debug, Clone)]
pub struct Vaccination {
    pub id: VaccinationId,
    pub child_id: ChildId,
    pub vaccine_id: VaccineId,
    pub date: NaiveDate,
    /// 1 始まり
    pub dose_number: i32,
    pub status: DoseStatus,
    /// district は施設から導出。欠けている行は district スコープから見えない
    pub location: Location,
    /// 検索用（保存はせず、読み込み時に結合）
    pub child_name: String,
    pub vaccine_name: String,
    pub created_at: DateTime<Utc>,
}

impl Vaccination {
    pub fn new(
        child_id: ChildId,
        vaccine_id: VaccineId,
        date: NaiveDate,
        dose_number: i32,
        status: DoseStatus,
        location: Location,
    ) -> Self {
        Self {
            id: VaccinationId::new(),
            child_id,
            vaccine_id,
            date,
            dose_number,
            status,
            location,
            child_name: String::new(),
            vaccine_name: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_names(mut self, child_name: &str, vaccine_name: &str) -> Self {
        self.child_name = child_name.to_string();
        self.vaccine_name = vaccine_name.to_string();
        self
    }
}

impl Filterable for Vaccination {
    fn field(&self, column: &str) -> FieldValue<'_> {
        match column {
            "date" => FieldValue::Date(self.date),
            "dose_number" => FieldValue::Number(i64::from(self.dose_number)),
            "status" => FieldValue::text(self.status.code()),
            "region" => FieldValue::opt_text(self.location.region.as_deref()),
            "district" => FieldValue::opt_text(self.location.district.as_deref()),
            "health_center" => FieldValue::opt_text(self.location.health_center.as_deref()),
            "child_name" => FieldValue::text(&self.child_name),
            "vaccine_name" => FieldValue::text(&self.vaccine_name),
            "created_at" => FieldValue::Timestamp(self.created_at),
            _ => FieldValue::Missing,
        }
    }
}
