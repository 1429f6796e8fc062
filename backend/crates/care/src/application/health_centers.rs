//! Health Center Use Cases

use std::sync::Arc;

use kernel::id::HealthCenterId;
use kernel::scope::{AccessScope, Level, Location, Principal};
use listing::{ListQuery, ResourceSchema, ScopeColumns, visibility_filter};

use crate::domain::entity::health_center::{HealthCenter, HealthCenterKind};
use crate::domain::repository::HealthCenterRepository;
use crate::error::{CareError, CareResult};

pub const HEALTH_CENTER_SCHEMA: ResourceSchema = ResourceSchema {
    sortable: &[
        ("createdAt", "created_at"),
        ("name", "name"),
        ("region", "region"),
        ("district", "district"),
    ],
    default_sort: "createdAt",
    searchable: &["name", "region", "district"],
    date_column: None,
    status: None,
};

/// 施設自身の所在カラム（施設名が health_center に当たる）
pub const HEALTH_CENTER_COLUMNS: ScopeColumns = ScopeColumns {
    region: "region",
    district: "district",
    health_center: "name",
};

pub struct CreateHealthCenterInput {
    pub name: String,
    pub region: String,
    pub kind: HealthCenterKind,
    pub district_name: Option<String>,
}

pub struct HealthCentersUseCase<H>
where
    H: HealthCenterRepository,
{
    centers: Arc<H>,
}

impl<H> HealthCentersUseCase<H>
where
    H: HealthCenterRepository,
{
    pub fn new(centers: Arc<H>) -> Self {
        Self { centers }
    }

    pub async fn list(
        &self,
        scope: &AccessScope,
        query: ListQuery,
    ) -> CareResult<(Vec<HealthCenter>, u64)> {
        let query = query.restrict(visibility_filter(scope, &HEALTH_CENTER_COLUMNS));
        self.centers.list(&query).await
    }

    /// 範囲外の施設は存在しないものとして扱う
    pub async fn get(&self, scope: &AccessScope, id: &HealthCenterId) -> CareResult<HealthCenter> {
        self.centers
            .find_by_id(id)
            .await?
            .filter(|center| scope.covers(&center.location()))
            .ok_or(CareError::NotFound("Health center"))
    }

    /// national は全域、regional は自分の region にのみ作成可能
    pub async fn create(
        &self,
        principal: &Principal,
        scope: &AccessScope,
        input: CreateHealthCenterInput,
    ) -> CareResult<HealthCenter> {
        if !matches!(principal.level, Level::National | Level::Regional) {
            return Err(CareError::Forbidden(
                "Only national and regional administrators can create health centers".into(),
            ));
        }

        let name = required(&input.name, "name")?;
        let region = required(&input.region, "region")?;
        let district_name = input
            .district_name
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        if !scope.covers(&Location::new(Some(region.clone()), None, None)) {
            return Err(CareError::Forbidden(
                "You can only create health centers in your own region".into(),
            ));
        }
        if self.centers.find_by_name(&name).await?.is_some() {
            return Err(CareError::Conflict(format!(
                "Health center '{name}' already exists"
            )));
        }

        let center = HealthCenter::new(name, region, input.kind, district_name);
        self.centers.create(&center).await?;

        tracing::info!(
            health_center_id = %center.id,
            name = %center.name,
            kind = %center.kind,
            created_by = %principal.user_id,
            "Health center created"
        );
        Ok(center)
    }
}

pub(crate) fn required(value: &str, field: &str) -> CareResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CareError::InvalidInput(format!("{field} is required")));
    }
    Ok(value.to_string())
}
