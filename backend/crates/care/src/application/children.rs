//! Children Use Cases

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use kernel::id::ChildId;
use kernel::scope::{AccessScope, Principal};
use listing::{ListQuery, ResourceSchema, ScopeColumns, StatusField, visibility_filter};
use platform::events::{EventBus, LiveEvent};

use crate::application::health_centers::required;
use crate::domain::entity::child::{Child, CoverageStatus};
use crate::domain::repository::{ChildRepository, HealthCenterRepository};
use crate::error::{CareError, CareResult};

pub const CHILD_SCHEMA: ResourceSchema = ResourceSchema {
    sortable: &[
        ("createdAt", "created_at"),
        ("name", "name"),
        ("birthDate", "birth_date"),
        ("vaccinationStatus", "vaccination_status"),
    ],
    default_sort: "createdAt",
    searchable: &["name", "parent_name", "parent_phone"],
    date_column: Some("birth_date"),
    status: Some(StatusField {
        column: "vaccination_status",
        allowed: CoverageStatus::CODES,
    }),
};

pub const RECORD_COLUMNS: ScopeColumns = ScopeColumns {
    region: "region",
    district: "district",
    health_center: "health_center",
};

pub struct RegisterChildInput {
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Option<String>,
    pub parent_name: String,
    pub parent_phone: String,
    pub health_center: String,
}

pub struct ChildrenUseCase<C, H>
where
    C: ChildRepository,
    H: HealthCenterRepository,
{
    children: Arc<C>,
    centers: Arc<H>,
    events: EventBus,
}

impl<C, H> ChildrenUseCase<C, H>
where
    C: ChildRepository,
    H: HealthCenterRepository,
{
    pub fn new(children: Arc<C>, centers: Arc<H>, events: EventBus) -> Self {
        Self {
            children,
            centers,
            events,
        }
    }

    pub async fn list(&self, scope: &AccessScope, query: ListQuery) -> CareResult<(Vec<Child>, u64)> {
        let query = query.restrict(visibility_filter(scope, &RECORD_COLUMNS));
        self.children.list(&query).await
    }

    pub async fn get(&self, scope: &AccessScope, id: &ChildId) -> CareResult<Child> {
        self.children
            .find_by_id(id)
            .await?
            .filter(|child| scope.covers(&child.location))
            .ok_or(CareError::NotFound("Child"))
    }

    /// 所属施設から region / district を導出して登録
    pub async fn register(
        &self,
        principal: &Principal,
        scope: &AccessScope,
        input: RegisterChildInput,
    ) -> CareResult<Child> {
        let name = required(&input.name, "name")?;
        let parent_name = required(&input.parent_name, "parentName")?;
        let parent_phone = required(&input.parent_phone, "parentPhone")?;
        let health_center = required(&input.health_center, "healthCenter")?;
        if input.birth_date > Utc::now().date_naive() {
            return Err(CareError::InvalidInput(
                "birthDate cannot be in the future".into(),
            ));
        }

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

        let gender = input
            .gender
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());
        let child = Child::new(name, input.birth_date, gender, parent_name, parent_phone, location);
        self.children.create(&child).await?;

        tracing::info!(
            child_id = %child.id,
            health_center = %center.name,
            registered_by = %principal.user_id,
            "Child registered"
        );
        self.events.publish(
            LiveEvent::new("child.registered", child.id)
                .at(child.location.clone())
                .with_payload(serde_json::json!({
                    "name": child.name,
                    "healthCenter": center.name,
                })),
        );

        Ok(child)
    }
}
