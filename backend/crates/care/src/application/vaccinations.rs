//! Vaccination Use Cases

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use kernel::id::{ChildId, VaccinationId, VaccineId};
use kernel::scope::{AccessScope, Principal};
use listing::{ListQuery, ResourceSchema, StatusField, visibility_filter};
use platform::events::{EventBus, LiveEvent};

use crate::application::children::RECORD_COLUMNS;
use crate::domain::entity::child::{Child, CoverageStatus};
use crate::domain::entity::vaccination::{DoseStatus, Vaccination};
use crate::domain::repository::{
    ChildRepository, HealthCenterRepository, VaccinationRepository, VaccineRepository,
};
use crate::error::{CareError, CareResult};

pub const VACCINATION_SCHEMA: ResourceSchema = ResourceSchema {
    sortable: &[
        ("createdAt", "created_at"),
        ("date", "date"),
        ("doseNumber", "dose_number"),
    ],
    default_sort: "date",
    searchable: &["child_name", "vaccine_name", "health_center"],
    date_column: Some("date"),
    status: Some(StatusField {
        column: "status",
        allowed: DoseStatus::CODES,
    }),
};

pub struct RecordVaccinationInput {
    pub child_id: ChildId,
    pub vaccine_id: VaccineId,
    pub date: NaiveDate,
    pub dose_number: i32,
    pub status: Option<DoseStatus>,
    /// 省略時は子どもの所属施設
    pub health_center: Option<String>,
}

pub struct UpdateVaccinationInput {
    pub status: DoseStatus,
    /// 省略時は元の日付
    pub date: Option<NaiveDate>,
}

pub struct VaccinationsUseCase<R, C, V, H>
where
    R: VaccinationRepository,
    C: ChildRepository,
    V: VaccineRepository,
    H: HealthCenterRepository,
{
    vaccinations: Arc<R>,
    children: Arc<C>,
    vaccines: Arc<V>,
    centers: Arc<H>,
    events: EventBus,
}

impl<R, C, V, H> VaccinationsUseCase<R, C, V, H>
where
    R: VaccinationRepository,
    C: ChildRepository,
    V: VaccineRepository,
    H: HealthCenterRepository,
{
    pub fn new(
        vaccinations: Arc<R>,
        children: Arc<C>,
        vaccines: Arc<V>,
        centers: Arc<H>,
        events: EventBus,
    ) -> Self {
        Self {
            vaccinations,
            children,
            vaccines,
            centers,
            events,
        }
    }

    pub async fn list(
        &self,
        scope: &AccessScope,
        query: ListQuery,
    ) -> CareResult<(Vec<Vaccination>, u64)> {
        let query = query.restrict(visibility_filter(scope, &RECORD_COLUMNS));
        self.vaccinations.list(&query).await
    }

    pub async fn get(&self, scope: &AccessScope, id: &VaccinationId) -> CareResult<Vaccination> {
        self.vaccinations
            .find_by_id(id)
            .await?
            .filter(|v| scope.covers(&v.location))
            .ok_or(CareError::NotFound("Vaccination"))
    }

    /// 接種を記録
    ///
    /// region / district は施設から導出します。記録後に子どもの接種状況を
    /// 再判定します。
    pub async fn record(
        &self,
        principal: &Principal,
        scope: &AccessScope,
        input: RecordVaccinationInput,
    ) -> CareResult<Vaccination> {
        if input.dose_number < 1 {
            return Err(CareError::InvalidInput(
                "doseNumber must be greater than or equal to 1".into(),
            ));
        }

        let mut child = self
            .children
            .find_by_id(&input.child_id)
            .await?
            .filter(|c| scope.covers(&c.location))
            .ok_or(CareError::NotFound("Child"))?;

        let vaccine = self
            .vaccines
            .find_by_id(&input.vaccine_id)
            .await?
            .ok_or_else(|| CareError::InvalidInput("Unknown vaccine".into()))?;

        let health_center = input
            .health_center
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .or_else(|| child.location.health_center.clone())
            .ok_or_else(|| CareError::InvalidInput("healthCenter is required".into()))?;
        let center = self
            .centers
            .find_by_name(&health_center)
            .await?
            .ok_or_else(|| CareError::InvalidInput(format!("Unknown health center: {health_center}")))?;
        let location = center.location();
        if !scope.covers(&location) {
            return Err(CareError::Forbidden(
                "The health center is outside your area".into(),
            ));
        }

        let status = input.status.unwrap_or_default();
        let vaccination = Vaccination::new(
            child.id,
            vaccine.id,
            input.date,
            input.dose_number,
            status,
            location,
        )
        .with_names(&child.name, &vaccine.name);
        self.vaccinations.create(&vaccination).await?;
        self.refresh_coverage(&mut child).await?;

        tracing::info!(
            vaccination_id = %vaccination.id,
            child_id = %child.id,
            vaccine = %vaccine.code,
            dose_number = vaccination.dose_number,
            status = %status,
            recorded_by = %principal.user_id,
            "Vaccination recorded"
        );
        self.events.publish(
            LiveEvent::new("vaccination.recorded", vaccination.id)
                .at(vaccination.location.clone())
                .with_payload(serde_json::json!({
                    "childId": child.id,
                    "vaccine": vaccine.name,
                    "doseNumber": vaccination.dose_number,
                    "status": status,
                })),
        );

        Ok(vaccination)
    }

    /// 接種記録の状態を変更（予定 → 完了 など）
    ///
    /// 範囲外の記録は 404。完了・取消済みの記録は 409。
    pub async fn update_status(
        &self,
        principal: &Principal,
        scope: &AccessScope,
        id: &VaccinationId,
        input: UpdateVaccinationInput,
    ) -> CareResult<Vaccination> {
        let current = self.get(scope, id).await?;

        if current.status.is_terminal() {
            return Err(CareError::Conflict(format!(
                "Vaccination is already {}",
                current.status
            )));
        }
        if !current.status.can_transition_to(input.status) {
            return Err(CareError::InvalidInput(format!(
                "Cannot change a {} vaccination to {}",
                current.status, input.status
            )));
        }

        let date = input.date.unwrap_or(current.date);
        let Some(updated) = self
            .vaccinations
            .update_status(id, current.status, input.status, date)
            .await?
        else {
            return Err(CareError::Conflict(
                "Vaccination was changed by another request".into(),
            ));
        };

        if let Some(mut child) = self.children.find_by_id(&updated.child_id).await? {
            self.refresh_coverage(&mut child).await?;
        }

        tracing::info!(
            vaccination_id = %updated.id,
            from = %current.status,
            to = %updated.status,
            updated_by = %principal.user_id,
            "Vaccination status changed"
        );
        self.events.publish(
            LiveEvent::new("vaccination.updated", updated.id)
                .at(updated.location.clone())
                .with_payload(serde_json::json!({
                    "childId": updated.child_id,
                    "vaccine": updated.vaccine_name,
                    "doseNumber": updated.dose_number,
                    "status": updated.status,
                })),
        );

        Ok(updated)
    }

    /// 接種記録とカタログから子どもの接種状況を再判定して保存
    async fn refresh_coverage(&self, child: &mut Child) -> CareResult<CoverageStatus> {
        let catalogue = self.vaccines.list_all().await?;
        let doses = self.vaccinations.list_for_child(&child.id).await?;
        let status = CoverageStatus::assess(&catalogue, &doses, Utc::now().date_naive());
        if child.apply_coverage(status) {
            self.children.update(child).await?;
            tracing::debug!(child_id = %child.id, status = %status, "Child coverage updated");
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard::DashboardUseCase;
    use crate::application::test_support::{agent_at, district, seed_centers};
    use crate::domain::repository::PendingTransferCounter;
    use crate::infra::memory::MemoryCareRepository;
    use chrono::Days;
    use kernel::scope::Location;
    use listing::RawListQuery;

    type UseCase = VaccinationsUseCase<
        MemoryCareRepository,
        MemoryCareRepository,
        MemoryCareRepository,
        MemoryCareRepository,
    >;

    struct NoTransfers;

    impl PendingTransferCounter for NoTransfers {
        async fn count_pending(&self, _scope: &AccessScope) -> CareResult<u64> {
            Ok(0)
        }
    }

    fn use_case(repo: &Arc<MemoryCareRepository>, events: EventBus) -> UseCase {
        VaccinationsUseCase::new(repo.clone(), repo.clone(), repo.clone(), repo.clone(), events)
    }

    async fn child_at(repo: &MemoryCareRepository, location: Location) -> Child {
        let child = Child::new(
            "Paul Mbarga".into(),
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            None,
            "Jeanne Mbarga".into(),
            "+237 677 00 00 00".into(),
            location,
        );
        ChildRepository::create(repo, &child).await.unwrap();
        child
    }

    async fn stored_status(repo: &MemoryCareRepository, id: &ChildId) -> CoverageStatus {
        ChildRepository::find_by_id(repo, id)
            .await
            .unwrap()
            .unwrap()
            .vaccination_status
    }

    fn mvog_ada() -> Location {
        Location::new(
            Some("Centre".into()),
            Some("Centre A".into()),
            Some("CSI Mvog-Ada".into()),
        )
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn input(child_id: ChildId, vaccine_id: VaccineId) -> RecordVaccinationInput {
        RecordVaccinationInput {
            child_id,
            vaccine_id,
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            dose_number: 1,
            status: None,
            health_center: None,
        }
    }

    fn scheduled_in_a_month(child_id: ChildId, vaccine_id: VaccineId) -> RecordVaccinationInput {
        RecordVaccinationInput {
            date: today() + Days::new(30),
            status: Some(DoseStatus::Scheduled),
            ..input(child_id, vaccine_id)
        }
    }

    #[tokio::test]
    async fn test_completed_dose_derives_district_and_starts_progress() {
        let repo = Arc::new(seed_centers().await);
        let bcg = repo.add_vaccine("BCG", "BCG", 1);
        repo.add_vaccine("Pentavalent", "PENTA", 3);
        let child = child_at(&repo, mvog_ada()).await;
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let (principal, scope) = agent_at("CSI Mvog-Ada");

        let vaccination = use_case(&repo, events)
            .record(&principal, &scope, input(child.id, bcg.id))
            .await
            .unwrap();
        assert_eq!(vaccination.status, DoseStatus::Completed);
        assert_eq!(vaccination.location.district.as_deref(), Some("Centre A"));
        assert_eq!(vaccination.vaccine_name, "BCG");

        assert_eq!(stored_status(&repo, &child.id).await, CoverageStatus::InProgress);
        assert_eq!(rx.recv().await.unwrap().event_type, "vaccination.recorded");
    }

    #[tokio::test]
    async fn test_completing_the_catalogue_makes_child_up_to_date() {
        let repo = Arc::new(seed_centers().await);
        let bcg = repo.add_vaccine("BCG", "BCG", 1);
        let child = child_at(&repo, mvog_ada()).await;
        let (principal, scope) = agent_at("CSI Mvog-Ada");

        use_case(&repo, EventBus::default())
            .record(&principal, &scope, input(child.id, bcg.id))
            .await
            .unwrap();
        assert_eq!(stored_status(&repo, &child.id).await, CoverageStatus::UpToDate);

        let summary = DashboardUseCase::new(repo.clone(), Arc::new(NoTransfers))
            .summary(&scope)
            .await
            .unwrap();
        assert_eq!(summary.children_by_status.up_to_date, 1);
        assert_eq!(summary.coverage_rate, 1.0);
    }

    #[tokio::test]
    async fn test_upcoming_dose_leaves_child_not_started() {
        let repo = Arc::new(seed_centers().await);
        let penta = repo.add_vaccine("Pentavalent", "PENTA", 3);
        let child = child_at(&repo, mvog_ada()).await;
        let (principal, scope) = agent_at("CSI Mvog-Ada");

        use_case(&repo, EventBus::default())
            .record(&principal, &scope, scheduled_in_a_month(child.id, penta.id))
            .await
            .unwrap();

        assert_eq!(stored_status(&repo, &child.id).await, CoverageStatus::NotStarted);
    }

    #[tokio::test]
    async fn test_missed_dose_makes_child_late() {
        let repo = Arc::new(seed_centers().await);
        let penta = repo.add_vaccine("Pentavalent", "PENTA", 3);
        let child = child_at(&repo, mvog_ada()).await;
        let (principal, scope) = agent_at("CSI Mvog-Ada");

        let mut missed = input(child.id, penta.id);
        missed.status = Some(DoseStatus::Missed);
        use_case(&repo, EventBus::default())
            .record(&principal, &scope, missed)
            .await
            .unwrap();

        assert_eq!(stored_status(&repo, &child.id).await, CoverageStatus::Late);
    }

    #[tokio::test]
    async fn test_scheduled_dose_completed_later_counts_everywhere() {
        let repo = Arc::new(seed_centers().await);
        let bcg = repo.add_vaccine("BCG", "BCG", 1);
        let child = child_at(&repo, mvog_ada()).await;
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let (principal, scope) = agent_at("CSI Mvog-Ada");
        let uc = use_case(&repo, events);
        let dashboard = DashboardUseCase::new(repo.clone(), Arc::new(NoTransfers));

        let scheduled = uc
            .record(&principal, &scope, scheduled_in_a_month(child.id, bcg.id))
            .await
            .unwrap();
        let before = dashboard.summary(&scope).await.unwrap();
        assert_eq!(before.completed_this_month, 0);
        assert_eq!(before.coverage_rate, 0.0);

        let completed = uc
            .update_status(
                &principal,
                &scope,
                &scheduled.id,
                UpdateVaccinationInput {
                    status: DoseStatus::Completed,
                    date: Some(today()),
                },
            )
            .await
            .unwrap();
        assert_eq!(completed.status, DoseStatus::Completed);
        assert_eq!(completed.date, today());
        assert_eq!(stored_status(&repo, &child.id).await, CoverageStatus::UpToDate);

        let after = dashboard.summary(&scope).await.unwrap();
        assert_eq!(after.completed_this_month, 1);
        assert_eq!(after.monthly_trend.last().map(|m| m.count), Some(1));
        assert_eq!(after.coverage_rate, 1.0);

        assert_eq!(rx.recv().await.unwrap().event_type, "vaccination.recorded");
        assert_eq!(rx.recv().await.unwrap().event_type, "vaccination.updated");
    }

    #[tokio::test]
    async fn test_status_update_rules() {
        let repo = Arc::new(seed_centers().await);
        let bcg = repo.add_vaccine("BCG", "BCG", 1);
        let child = child_at(&repo, mvog_ada()).await;
        let (principal, scope) = agent_at("CSI Mvog-Ada");
        let uc = use_case(&repo, EventBus::default());
        let to = |status| UpdateVaccinationInput { status, date: None };

        let scheduled = uc
            .record(&principal, &scope, scheduled_in_a_month(child.id, bcg.id))
            .await
            .unwrap();
        assert!(matches!(
            uc.update_status(&principal, &scope, &scheduled.id, to(DoseStatus::Scheduled))
                .await,
            Err(CareError::InvalidInput(_))
        ));

        let (other, other_scope) = agent_at("CSI Nlongkak");
        assert!(matches!(
            uc.update_status(&other, &other_scope, &scheduled.id, to(DoseStatus::Missed))
                .await,
            Err(CareError::NotFound("Vaccination"))
        ));

        let missed = uc
            .update_status(&principal, &scope, &scheduled.id, to(DoseStatus::Missed))
            .await
            .unwrap();
        assert_eq!(missed.date, scheduled.date);
        let cancelled = uc
            .update_status(&principal, &scope, &scheduled.id, to(DoseStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(cancelled.status, DoseStatus::Cancelled);
        assert!(matches!(
            uc.update_status(&principal, &scope, &scheduled.id, to(DoseStatus::Completed))
                .await,
            Err(CareError::Conflict(_))
        ));
        assert_eq!(stored_status(&repo, &child.id).await, CoverageStatus::NotStarted);
    }

    #[tokio::test]
    async fn test_search_matches_child_and_vaccine_names() {
        let repo = Arc::new(seed_centers().await);
        let bcg = repo.add_vaccine("BCG", "BCG", 1);
        let penta = repo.add_vaccine("Pentavalent", "PENTA", 3);
        let child = child_at(&repo, mvog_ada()).await;
        let (principal, scope) = agent_at("CSI Mvog-Ada");
        let uc = use_case(&repo, EventBus::default());
        for vaccine in [&bcg, &penta] {
            uc.record(&principal, &scope, input(child.id, vaccine.id))
                .await
                .unwrap();
        }

        let search = |term: &str| {
            let raw = RawListQuery {
                search: Some(term.to_string()),
                ..RawListQuery::default()
            };
            ListQuery::parse(&raw, &VACCINATION_SCHEMA).unwrap()
        };

        let (by_child, total) = uc.list(&scope, search("mbarga")).await.unwrap();
        assert_eq!(total, 2);
        assert!(by_child.iter().all(|v| v.child_name == "Paul Mbarga"));

        let (by_vaccine, total) = uc.list(&scope, search("penta")).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(by_vaccine[0].vaccine_id, penta.id);

        let (none, total) = uc.list(&scope, search("rougeole")).await.unwrap();
        assert!(none.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_child_outside_scope_is_not_found() {
        let repo = Arc::new(seed_centers().await);
        let bcg = repo.add_vaccine("BCG", "BCG", 1);
        let child = child_at(&repo, mvog_ada()).await;
        let (principal, scope) = district("Centre B");

        let result = use_case(&repo, EventBus::default())
            .record(&principal, &scope, input(child.id, bcg.id))
            .await;
        assert!(matches!(result, Err(CareError::NotFound("Child"))));
        assert!(repo.vaccinations().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_bad_dose_and_unknown_vaccine() {
        let repo = Arc::new(seed_centers().await);
        let child = child_at(&repo, mvog_ada()).await;
        let (principal, scope) = agent_at("CSI Mvog-Ada");
        let uc = use_case(&repo, EventBus::default());

        let mut zero = input(child.id, VaccineId::new());
        zero.dose_number = 0;
        assert!(matches!(
            uc.record(&principal, &scope, zero).await,
            Err(CareError::InvalidInput(_))
        ));
        assert!(matches!(
            uc.record(&principal, &scope, input(child.id, VaccineId::new())).await,
            Err(CareError::InvalidInput(m)) if m == "Unknown vaccine"
        ));
    }

    #[tokio::test]
    async fn test_district_visibility_follows_derived_district() {
        let repo = Arc::new(seed_centers().await);
        let bcg = repo.add_vaccine("BCG", "BCG", 1);
        let child = child_at(&repo, mvog_ada()).await;
        let (principal, scope) = agent_at("CSI Mvog-Ada");
        let uc = use_case(&repo, EventBus::default());
        let vaccination = uc
            .record(&principal, &scope, input(child.id, bcg.id))
            .await
            .unwrap();

        let (_, centre_a) = district("Centre A");
        let (_, centre_b) = district("Centre B");
        let (visible, total) = uc.list(&centre_a, ListQuery::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(visible[0].id, vaccination.id);

        let (hidden, total) = uc.list(&centre_b, ListQuery::default()).await.unwrap();
        assert!(hidden.is_empty());
        assert_eq!(total, 0);
        assert!(matches!(
            uc.get(&centre_b, &vaccination.id).await,
            Err(CareError::NotFound("Vaccination"))
        ));
    }
}
