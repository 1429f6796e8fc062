//! Repository Traits
//!
//! Persistence interfaces; implementations live in `infra`.

use chrono::NaiveDate;
use kernel::id::{ChildId, HealthCenterId, VaccinationId, VaccineId};
use kernel::scope::AccessScope;
use listing::{Filter, ListQuery};

use crate::domain::entity::{
    child::{Child, CoverageStatus},
    health_center::HealthCenter,
    vaccination::{DoseStatus, Vaccination},
    vaccine::Vaccine,
};
use crate::error::CareResult;

#[trait_variant::make(HealthCenterRepository: Send)]
pub trait LocalHealthCenterRepository {
    async fn create(&self, center: &HealthCenter) -> CareResult<()>;

    async fn find_by_id(&self, id: &HealthCenterId) -> CareResult<Option<HealthCenter>>;

    /// 施設名は一意
    async fn find_by_name(&self, name: &str) -> CareResult<Option<HealthCenter>>;

    async fn list(&self, query: &ListQuery) -> CareResult<(Vec<HealthCenter>, u64)>;
}

#[trait_variant::make(VaccineRepository: Send)]
pub trait LocalVaccineRepository {
    async fn list_all(&self) -> CareResult<Vec<Vaccine>>;

    async fn find_by_id(&self, id: &VaccineId) -> CareResult<Option<Vaccine>>;
}

#[trait_variant::make(ChildRepository: Send)]
pub trait LocalChildRepository {
    async fn create(&self, child: &Child) -> CareResult<()>;

    async fn find_by_id(&self, id: &ChildId) -> CareResult<Option<Child>>;

    async fn update(&self, child: &Child) -> CareResult<()>;

    async fn list(&self, query: &ListQuery) -> CareResult<(Vec<Child>, u64)>;
}

#[trait_variant::make(VaccinationRepository: Send)]
pub trait LocalVaccinationRepository {
    async fn create(&self, vaccination: &Vaccination) -> CareResult<()>;

    async fn find_by_id(&self, id: &VaccinationId) -> CareResult<Option<Vaccination>>;

    async fn list(&self, query: &ListQuery) -> CareResult<(Vec<Vaccination>, u64)>;

    /// 子どもの全接種記録（接種状況の再判定用）
    async fn list_for_child(&self, child_id: &ChildId) -> CareResult<Vec<Vaccination>>;

    /// 状態が `expected` のままなら `status` / `date` を更新
    ///
    /// 別の更新が先に入っていた場合は `None`。
    async fn update_status(
        &self,
        id: &VaccinationId,
        expected: DoseStatus,
        status: DoseStatus,
        date: NaiveDate,
    ) -> CareResult<Option<Vaccination>>;
}

/// ダッシュボード用の集計
///
/// フィルタには呼び出し元の参照範囲が含まれている前提です。
#[trait_variant::make(DashboardRepository: Send)]
pub trait LocalDashboardRepository {
    async fn children_by_status(&self, filter: &Filter) -> CareResult<Vec<(CoverageStatus, u64)>>;

    async fn count_vaccinations(&self, filter: &Filter) -> CareResult<u64>;

    /// 月初日ごとの件数（古い順）
    async fn vaccinations_per_month(
        &self,
        filter: &Filter,
        since: NaiveDate,
    ) -> CareResult<Vec<(NaiveDate, u64)>>;

    /// `column` の値ごとの件数（値が無い行は除外）
    async fn vaccinations_grouped_by(
        &self,
        filter: &Filter,
        column: &'static str,
    ) -> CareResult<Vec<(String, u64)>>;
}

/// 参照範囲内の未処理の在庫移送数（stock クレートが実装）
#[trait_variant::make(PendingTransferCounter: Send)]
pub trait LocalPendingTransferCounter {
    async fn count_pending(&self, scope: &AccessScope) -> CareResult<u64>;
}

/// district の一括補完結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub children: u64,
    pub vaccinations: u64,
}

#[trait_variant::make(DistrictBackfill: Send)]
pub trait LocalDistrictBackfill {
    /// district が空の子ども・接種記録に施設の district を設定（冪等）
    async fn backfill_districts(&self) -> CareResult<BackfillReport>;
}

/// care の全リポジトリを 1 つの型で提供するストア（HTTP 層の状態に使う）
pub trait CareStore:
    HealthCenterRepository
    + VaccineRepository
    + ChildRepository
    + VaccinationRepository
    + DashboardRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> CareStore for T where
    T: HealthCenterRepository
        + VaccineRepository
        + ChildRepository
        + VaccinationRepository
        + DashboardRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
