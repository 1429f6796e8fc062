//! In-memory repository used by unit tests

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Datelike, NaiveDate};
use kernel::id::{ChildId, HealthCenterId, VaccinationId, VaccineId};
use kernel::scope::Location;
use listing::{FieldValue, Filter, Filterable, ListQuery, paginate_in_memory};

use crate::domain::entity::{
    child::{Child, CoverageStatus},
    health_center::HealthCenter,
    vaccination::{DoseStatus, Vaccination},
    vaccine::Vaccine,
};
use crate::domain::repository::{
    BackfillReport, ChildRepository, DashboardRepository, DistrictBackfill,
    HealthCenterRepository, VaccinationRepository, VaccineRepository,
};
use crate::error::{CareError, CareResult};

#[derive(Default)]
struct State {
    centers: Vec<HealthCenter>,
    vaccines: Vec<Vaccine>,
    children: Vec<Child>,
    vaccinations: Vec<Vaccination>,
}

#[derive(Clone, Default)]
pub struct MemoryCareRepository {
    state: Arc<Mutex<State>>,
}

impl MemoryCareRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_vaccine(&self, name: &str, code: &str, doses_required: i16) -> Vaccine {
        let vaccine = Vaccine {
            id: VaccineId::new(),
            name: name.to_string(),
            code: code.to_string(),
            doses_required,
        };
        self.lock().vaccines.push(vaccine.clone());
        vaccine
    }

    pub fn children(&self) -> Vec<Child> {
        self.lock().children.clone()
    }

    pub fn vaccinations(&self) -> Vec<Vaccination> {
        self.lock().vaccinations.clone()
    }
}

fn district_for(centers: &[HealthCenter], health_center: &str) -> String {
    centers
        .iter()
        .find(|c| c.name == health_center)
        .map_or_else(|| health_center.to_string(), |c| c.district().to_string())
}

fn text_of(value: FieldValue<'_>) -> Option<String> {
    match value {
        FieldValue::Text(text) => Some(text.into_owned()),
        _ => None,
    }
}

impl HealthCenterRepository for MemoryCareRepository {
    async fn create(&self, center: &HealthCenter) -> CareResult<()> {
        let mut state = self.lock();
        if state.centers.iter().any(|c| c.name == center.name) {
            return Err(CareError::Conflict(format!(
                "Health center '{}' already exists",
                center.name
            )));
        }
        state.centers.push(center.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &HealthCenterId) -> CareResult<Option<HealthCenter>> {
        Ok(self.lock().centers.iter().find(|c| &c.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> CareResult<Option<HealthCenter>> {
        Ok(self.lock().centers.iter().find(|c| c.name == name).cloned())
    }

    async fn list(&self, query: &ListQuery) -> CareResult<(Vec<HealthCenter>, u64)> {
        Ok(paginate_in_memory(&self.lock().centers, query))
    }
}

impl VaccineRepository for MemoryCareRepository {
    async fn list_all(&self) -> CareResult<Vec<Vaccine>> {
        let mut vaccines = self.lock().vaccines.clone();
        vaccines.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(vaccines)
    }

    async fn find_by_id(&self, id: &VaccineId) -> CareResult<Option<Vaccine>> {
        Ok(self.lock().vaccines.iter().find(|v| &v.id == id).cloned())
    }
}

impl ChildRepository for MemoryCareRepository {
    async fn create(&self, child: &Child) -> CareResult<()> {
        self.lock().children.push(child.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ChildId) -> CareResult<Option<Child>> {
        Ok(self.lock().children.iter().find(|c| &c.id == id).cloned())
    }

    async fn update(&self, child: &Child) -> CareResult<()> {
        if let Some(stored) = self.lock().children.iter_mut().find(|c| c.id == child.id) {
            *stored = child.clone();
        }
        Ok(())
    }

    async fn list(&self, query: &ListQuery) -> CareResult<(Vec<Child>, u64)> {
        Ok(paginate_in_memory(&self.lock().children, query))
    }
}

impl VaccinationRepository for MemoryCareRepository {
    async fn create(&self, vaccination: &Vaccination) -> CareResult<()> {
        self.lock().vaccinations.push(vaccination.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &VaccinationId) -> CareResult<Option<Vaccination>> {
        Ok(self.lock().vaccinations.iter().find(|v| &v.id == id).cloned())
    }

    async fn list(&self, query: &ListQuery) -> CareResult<(Vec<Vaccination>, u64)> {
        Ok(paginate_in_memory(&self.lock().vaccinations, query))
    }

    async fn list_for_child(&self, child_id: &ChildId) -> CareResult<Vec<Vaccination>> {
        Ok(self
            .lock()
            .vaccinations
            .iter()
            .filter(|v| &v.child_id == child_id)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: &VaccinationId,
        expected: DoseStatus,
        status: DoseStatus,
        date: NaiveDate,
    ) -> CareResult<Option<Vaccination>> {
        let mut state = self.lock();
        let Some(stored) = state
            .vaccinations
            .iter_mut()
            .find(|v| &v.id == id && v.status == expected)
        else {
            return Ok(None);
        };
        stored.status = status;
        stored.date = date;
        Ok(Some(stored.clone()))
    }
}

impl DashboardRepository for MemoryCareRepository {
    async fn children_by_status(&self, filter: &Filter) -> CareResult<Vec<(CoverageStatus, u64)>> {
        let state = self.lock();
        Ok(CoverageStatus::ALL
            .into_iter()
            .map(|status| {
                let n = state
                    .children
                    .iter()
                    .filter(|c| c.vaccination_status == status && filter.matches(*c))
                    .count() as u64;
                (status, n)
            })
            .filter(|(_, n)| *n > 0)
            .collect())
    }

    async fn count_vaccinations(&self, filter: &Filter) -> CareResult<u64> {
        let state = self.lock();
        Ok(state.vaccinations.iter().filter(|v| filter.matches(*v)).count() as u64)
    }

    async fn vaccinations_per_month(
        &self,
        filter: &Filter,
        since: NaiveDate,
    ) -> CareResult<Vec<(NaiveDate, u64)>> {
        let state = self.lock();
        let mut months: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for v in state
            .vaccinations
            .iter()
            .filter(|v| v.date >= since && filter.matches(*v))
        {
            if let Some(month) = v.date.with_day(1) {
                *months.entry(month).or_default() += 1;
            }
        }
        Ok(months.into_iter().collect())
    }

    async fn vaccinations_grouped_by(
        &self,
        filter: &Filter,
        column: &'static str,
    ) -> CareResult<Vec<(String, u64)>> {
        let state = self.lock();
        let mut groups: BTreeMap<String, u64> = BTreeMap::new();
        for v in state.vaccinations.iter().filter(|v| filter.matches(*v)) {
            if let Some(key) = text_of(v.field(column)) {
                *groups.entry(key).or_default() += 1;
            }
        }
        let mut groups: Vec<_> = groups.into_iter().collect();
        groups.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(groups)
    }
}

impl DistrictBackfill for MemoryCareRepository {
    async fn backfill_districts(&self) -> CareResult<BackfillReport> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let mut report = BackfillReport::default();

        let fill = |location: &mut Location| -> bool {
            match (&location.district, &location.health_center) {
                (None, Some(hc)) => {
                    location.district = Some(district_for(&state.centers, hc));
                    true
                }
                _ => false,
            }
        };

        for child in state.children.iter_mut() {
            if fill(&mut child.location) {
                report.children += 1;
            }
        }
        for vaccination in state.vaccinations.iter_mut() {
            if fill(&mut vaccination.location) {
                report.vaccinations += 1;
            }
        }
        Ok(report)
    }
}

impl auth::HealthCenterDirectory for MemoryCareRepository {
    async fn locate(&self, health_center: &str) -> auth::AuthResult<Option<Location>> {
        Ok(self
            .lock()
            .centers
            .iter()
            .find(|c| c.name == health_center)
            .map(HealthCenter::location))
    }
}
