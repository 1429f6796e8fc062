//! District Backfill Use Case

use std::sync::Arc;

use crate::domain::repository::{BackfillReport, DistrictBackfill};
use crate::error::CareResult;

pub struct BackfillDistrictsUseCase<B>
where
    B: DistrictBackfill,
{
    repo: Arc<B>,
}

impl<B> BackfillDistrictsUseCase<B>
where
    B: DistrictBackfill,
{
    pub fn new(repo: Arc<B>) -> Self {
        Self { repo }
    }

    /// 何度実行しても結果は同じ（2 回目以降は 0 件）
    pub async fn execute(&self) -> CareResult<BackfillReport> {
        let report = self.repo.backfill_districts().await?;
        tracing::info!(
            children = report.children,
            vaccinations = report.vaccinations,
            "District backfill completed"
        );
        Ok(report)
    }
}
