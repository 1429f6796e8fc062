//! Child Entity

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use kernel::id::{ChildId, VaccineId};
use kernel::scope::Location;
use listing::{FieldValue, Filterable};
use serde::{Deserialize, Serialize};

use super::vaccination::{DoseStatus, Vaccination};
use super::vaccine::Vaccine;

/// 接種の進み具合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    #[default]
    #[display("not_started")]
    NotStarted,
    #[display("in_progress")]
    InProgress,
    #[display("up_to_date")]
    UpToDate,
    #[display("late")]
    Late,
}

impl CoverageStatus {
    pub const ALL: [CoverageStatus; 4] = [
        CoverageStatus::NotStarted,
        CoverageStatus::InProgress,
        CoverageStatus::UpToDate,
        CoverageStatus::Late,
    ];

    /// 一覧の status 絞り込みで受け付ける値
    pub const CODES: &'static [&'static str] = &["not_started", "in_progress", "up_to_date", "late"];

    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::UpToDate => "up_to_date",
            Self::Late => "late",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// カタログと子どもの接種記録から判定
    ///
    /// 1. 全ワクチンで必要回数ぶんの completed がそろえば `up_to_date`
    /// 2. まだ完了していない回に missed か期日超過の scheduled があれば `late`
    /// 3. completed が 1 件でもあれば `in_progress`、無ければ `not_started`
    pub fn assess(catalogue: &[Vaccine], doses: &[Vaccination], today: NaiveDate) -> Self {
        let completed: HashSet<(VaccineId, i32)> = doses
            .iter()
            .filter(|d| d.status == DoseStatus::Completed)
            .map(|d| (d.vaccine_id, d.dose_number))
            .collect();

        let mut per_vaccine: HashMap<VaccineId, usize> = HashMap::new();
        for (vaccine_id, _) in &completed {
            *per_vaccine.entry(*vaccine_id).or_default() += 1;
        }
        let fully_covered = !catalogue.is_empty()
            && catalogue.iter().all(|v| {
                let required = usize::try_from(v.doses_required).unwrap_or(0);
                per_vaccine.get(&v.id).copied().unwrap_or(0) >= required
            });
        if fully_covered {
            return Self::UpToDate;
        }

        let overdue = doses.iter().any(|d| {
            !completed.contains(&(d.vaccine_id, d.dose_number))
                && match d.status {
                    DoseStatus::Missed => true,
                    DoseStatus::Scheduled => d.date < today,
                    DoseStatus::Completed | DoseStatus::Cancelled => false,
                }
        });
        if overdue {
            Self::Late
        } else if completed.is_empty() {
            Self::NotStarted
        } else {
            Self::InProgress
        }
    }
}

#[derive(Debug, Clone)]
pub struct Child {
    pub id: ChildId,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Option<String>,
    pub parent_name: String,
    pub parent_phone: String,
    /// region / district は所属施設から導出
    pub location: Location,
    pub vaccination_status: CoverageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Child {
    pub fn new(
        name: String,
        birth_date: NaiveDate,
        gender: Option<String>,
        parent_name: String,
        parent_phone: String,
        location: Location,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ChildId::new(),
            name,
            birth_date,
            gender,
            parent_name,
            parent_phone,
            location,
            vaccination_status: CoverageStatus::NotStarted,
            created_at: now,
            updated_at: now,
        }
    }

    /// 判定結果を反映。変わったときだけ `true`
    pub fn apply_coverage(&mut self, status: CoverageStatus) -> bool {
        if self.vaccination_status == status {
            return false;
        }
        self.vaccination_status = status;
        self.updated_at = Utc::now();
        true
    }
}

impl Filterable for Child {
    fn field(&self, column: &str) -> FieldValue<'_> {
        match column {
            "name" => FieldValue::text(&self.name),
            "parent_name" => FieldValue::text(&self.parent_name),
            "parent_phone" => FieldValue::text(&self.parent_phone),
            "birth_date" => FieldValue::Date(self.birth_date),
            "region" => FieldValue::opt_text(self.location.region.as_deref()),
            "district" => FieldValue::opt_text(self.location.district.as_deref()),
            "health_center" => FieldValue::opt_text(self.location.health_center.as_deref()),
            "vaccination_status" => FieldValue::text(self.vaccination_status.code()),
            "created_at" => FieldValue::Timestamp(self.created_at),
            _ => FieldValue::Missing,
        }
    }
}
