//! Dashboard Use Case
//!
//! Aggregates over the caller's scope. The breakdown is one tier finer than
//! the scope: regions for national, districts for regional, health centers
//! below that.

use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate, Utc};
use kernel::scope::{AccessScope, Level, Principal};
use listing::{Filter, visibility_filter};
use serde::Serialize;

use crate::application::children::RECORD_COLUMNS;
use crate::domain::entity::child::CoverageStatus;
use crate::domain::entity::vaccination::DoseStatus;
use crate::domain::repository::{DashboardRepository, PendingTransferCounter};
use crate::error::{CareError, CareResult};

/// 推移を出す月数（当月を含む）
const TREND_MONTHS: u32 = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub not_started: u64,
    pub in_progress: u64,
    pub up_to_date: u64,
    pub late: u64,
}

impl StatusCounts {
    fn add(&mut self, status: CoverageStatus, n: u64) {
        let slot = match status {
            CoverageStatus::NotStarted => &mut self.not_started,
            CoverageStatus::InProgress => &mut self.in_progress,
            CoverageStatus::UpToDate => &mut self.up_to_date,
            CoverageStatus::Late => &mut self.late,
        };
        *slot += n;
    }

    fn total(&self) -> u64 {
        self.not_started + self.in_progress + self.up_to_date + self.late
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub scope: AccessScope,
    pub total_children: u64,
    pub children_by_status: StatusCounts,
    /// up_to_date / total（子どもが居なければ 0）
    pub coverage_rate: f64,
    pub total_vaccinations: u64,
    pub completed_this_month: u64,
    pub pending_transfers: u64,
    pub monthly_trend: Vec<MonthCount>,
    /// どのカラムで集計したか（region / district / health_center）
    pub breakdown_by: &'static str,
    pub breakdown: Vec<GroupCount>,
}

pub struct DashboardUseCase<R, T>
where
    R: DashboardRepository,
    T: PendingTransferCounter,
{
    stats: Arc<R>,
    transfers: Arc<T>,
}

impl<R, T> DashboardUseCase<R, T>
where
    R: DashboardRepository,
    T: PendingTransferCounter,
{
    pub fn new(stats: Arc<R>, transfers: Arc<T>) -> Self {
        Self { stats, transfers }
    }

    pub async fn summary(&self, scope: &AccessScope) -> CareResult<DashboardSummary> {
        self.summary_on(scope, Utc::now().date_naive()).await
    }

    /// `/dashboard/{level}` 用。パスの階層は呼び出し元の階層と一致する必要がある
    pub async fn for_level(
        &self,
        principal: &Principal,
        scope: &AccessScope,
        level: &str,
    ) -> CareResult<DashboardSummary> {
        let requested = Level::from_code(level)
            .map_err(|_| CareError::InvalidInput(format!("Unknown dashboard level: {level}")))?;
        if requested != principal.level {
            return Err(CareError::Forbidden(format!(
                "The {requested} dashboard is not available to {} users",
                principal.level
            )));
        }
        self.summary(scope).await
    }

    async fn summary_on(&self, scope: &AccessScope, today: NaiveDate) -> CareResult<DashboardSummary> {
        let visible = visibility_filter(scope, &RECORD_COLUMNS);
        let completed = Filter::and([
            visible.clone(),
            Filter::eq("status", DoseStatus::Completed.code()),
        ]);
        let month_start = first_of_month(today)?;
        let since = month_start
            .checked_sub_months(Months::new(TREND_MONTHS - 1))
            .ok_or_else(|| CareError::Internal("dashboard trend window out of range".into()))?;

        let mut children_by_status = StatusCounts::default();
        for (status, n) in self.stats.children_by_status(&visible).await? {
            children_by_status.add(status, n);
        }
        let total_children = children_by_status.total();
        let coverage_rate = if total_children == 0 {
            0.0
        } else {
            children_by_status.up_to_date as f64 / total_children as f64
        };

        let total_vaccinations = self.stats.count_vaccinations(&visible).await?;
        let completed_this_month = self
            .stats
            .count_vaccinations(&Filter::and([
                completed.clone(),
                Filter::date_range("date", Some(month_start), Some(today)),
            ]))
            .await?;

        let per_month = self.stats.vaccinations_per_month(&completed, since).await?;
        let monthly_trend = (0..TREND_MONTHS)
            .filter_map(|i| since.checked_add_months(Months::new(i)))
            .map(|month| MonthCount {
                month: month.format("%Y-%m").to_string(),
                count: per_month
                    .iter()
                    .find(|(m, _)| *m == month)
                    .map_or(0, |(_, n)| *n),
            })
            .collect();

        let breakdown_by = breakdown_column(scope);
        let breakdown = self
            .stats
            .vaccinations_grouped_by(&visible, breakdown_by)
            .await?
            .into_iter()
            .map(|(name, count)| GroupCount { name, count })
            .collect();

        let pending_transfers = self.transfers.count_pending(scope).await?;

        tracing::debug!(scope = ?scope, total_children, total_vaccinations, "Dashboard computed");

        Ok(DashboardSummary {
            scope: scope.clone(),
            total_children,
            children_by_status,
            coverage_rate,
            total_vaccinations,
            completed_this_month,
            pending_transfers,
            monthly_trend,
            breakdown_by,
            breakdown,
        })
    }
}

fn first_of_month(date: NaiveDate) -> CareResult<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .ok_or_else(|| CareError::Internal(format!("no first day for {date}")))
}

fn breakdown_column(scope: &AccessScope) -> &'static str {
    match scope {
        AccessScope::National => RECORD_COLUMNS.region,
        AccessScope::Regional { .. } => RECORD_COLUMNS.district,
        AccessScope::District { .. } | AccessScope::Agent { .. } => RECORD_COLUMNS.health_center,
    }
}
