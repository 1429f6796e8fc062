//! PostgreSQL Repository Implementations

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::{ChildId, HealthCenterId, VaccinationId, VaccineId};
use kernel::scope::Location;
use listing::{Filter, ListQuery};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::entity::{
    child::{Child, CoverageStatus},
    health_center::{HealthCenter, HealthCenterKind},
    vaccination::{DoseStatus, Vaccination},
    vaccine::Vaccine,
};
use crate::domain::repository::{
    BackfillReport, ChildRepository, DashboardRepository, DistrictBackfill,
    HealthCenterRepository, VaccinationRepository, VaccineRepository,
};
use crate::error::{CareError, CareResult};

/// district を計算済みの施設ビュー
const HEALTH_CENTER_SOURCE: &str = r#"(
    SELECT
        id,
        name,
        region,
        kind,
        district_name,
        CASE WHEN kind = 'district' THEN name ELSE COALESCE(district_name, name) END AS district,
        created_at
    FROM health_centers
) AS h"#;

const HEALTH_CENTER_COLUMNS: &str = "id, name, region, kind, district_name, created_at";

const CHILD_COLUMNS: &str = r#"
    id,
    name,
    birth_date,
    gender,
    parent_name,
    parent_phone,
    region,
    district,
    health_center,
    vaccination_status,
    created_at,
    updated_at
"#;

const VACCINATION_COLUMNS: &str = r#"
    id,
    child_id,
    vaccine_id,
    date,
    dose_number,
    status,
    region,
    district,
    health_center,
    created_at,
    child_name,
    vaccine_name
"#;

/// 子どもとワクチンの名前を結合した接種ビュー（検索用）
const VACCINATION_SOURCE: &str = r#"(
    SELECT
        v.id,
        v.child_id,
        v.vaccine_id,
        v.date,
        v.dose_number,
        v.status,
        v.region,
        v.district,
        v.health_center,
        v.created_at,
        c.name AS child_name,
        vc.name AS vaccine_name
    FROM vaccinations v
    JOIN children c ON c.id = v.child_id
    JOIN vaccines vc ON vc.id = v.vaccine_id
) AS v"#;

/// 施設の district を引けない行は施設名で埋める
const DISTRICT_FROM_HEALTH_CENTER: &str = r#"
    COALESCE(
        (SELECT CASE WHEN h.kind = 'district' THEN h.name ELSE COALESCE(h.district_name, h.name) END
         FROM health_centers h WHERE h.name = t.health_center),
        t.health_center
    )
"#;

/// PostgreSQL-backed care repository
#[derive(Clone)]
pub struct PgCareRepository {
    pool: PgPool,
}

impl PgCareRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn count(pool: &PgPool, source: &str, filter: &Filter) -> CareResult<u64> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {source}"));
    listing::sql::push_where(&mut qb, filter);
    let total: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(total.max(0) as u64)
}

// ============================================================================
// Health Center Repository Implementation
// ============================================================================

impl HealthCenterRepository for PgCareRepository {
    async fn create(&self, center: &HealthCenter) -> CareResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO health_centers (id, name, region, kind, district_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(center.id.as_uuid())
        .bind(&center.name)
        .bind(&center.region)
        .bind(center.kind.code())
        .bind(&center.district_name)
        .bind(center.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(CareError::Conflict(
                format!("Health center '{}' already exists", center.name),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &HealthCenterId) -> CareResult<Option<HealthCenter>> {
        let row = sqlx::query_as::<_, HealthCenterRow>(&format!(
            "SELECT {HEALTH_CENTER_COLUMNS} FROM health_centers WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(HealthCenterRow::into_center).transpose()
    }

    async fn find_by_name(&self, name: &str) -> CareResult<Option<HealthCenter>> {
        let row = sqlx::query_as::<_, HealthCenterRow>(&format!(
            "SELECT {HEALTH_CENTER_COLUMNS} FROM health_centers WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(HealthCenterRow::into_center).transpose()
    }

    async fn list(&self, query: &ListQuery) -> CareResult<(Vec<HealthCenter>, u64)> {
        let total = count(&self.pool, HEALTH_CENTER_SOURCE, &query.filter).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {HEALTH_CENTER_COLUMNS} FROM {HEALTH_CENTER_SOURCE}"
        ));
        listing::sql::push_where(&mut select, &query.filter);
        listing::sql::push_order_and_page(&mut select, query);
        let rows = select
            .build_query_as::<HealthCenterRow>()
            .fetch_all(&self.pool)
            .await?;

        let centers = rows
            .into_iter()
            .map(HealthCenterRow::into_center)
            .collect::<CareResult<Vec<_>>>()?;
        Ok((centers, total))
    }
}

// ============================================================================
// Vaccine Repository Implementation
// ============================================================================

impl VaccineRepository for PgCareRepository {
    async fn list_all(&self) -> CareResult<Vec<Vaccine>> {
        let rows = sqlx::query_as::<_, VaccineRow>(
            "SELECT id, name, code, doses_required FROM vaccines ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(VaccineRow::into_vaccine).collect())
    }

    async fn find_by_id(&self, id: &VaccineId) -> CareResult<Option<Vaccine>> {
        let row = sqlx::query_as::<_, VaccineRow>(
            "SELECT id, name, code, doses_required FROM vaccines WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VaccineRow::into_vaccine))
    }
}

// ============================================================================
// Child Repository Implementation
// ============================================================================

impl ChildRepository for PgCareRepository {
    async fn create(&self, child: &Child) -> CareResult<()> {
        sqlx::query(
            r#"
            INSERT INTO children (
                id,
                name,
                birth_date,
                gender,
                parent_name,
                parent_phone,
                region,
                district,
                health_center,
                vaccination_status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(child.id.as_uuid())
        .bind(&child.name)
        .bind(child.birth_date)
        .bind(&child.gender)
        .bind(&child.parent_name)
        .bind(&child.parent_phone)
        .bind(&child.location.region)
        .bind(&child.location.district)
        .bind(&child.location.health_center)
        .bind(child.vaccination_status.code())
        .bind(child.created_at)
        .bind(child.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &ChildId) -> CareResult<Option<Child>> {
        let row = sqlx::query_as::<_, ChildRow>(&format!(
            "SELECT {CHILD_COLUMNS} FROM children WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ChildRow::into_child).transpose()
    }

    async fn update(&self, child: &Child) -> CareResult<()> {
        sqlx::query(
            r#"
            UPDATE children SET
                name = $2,
                gender = $3,
                parent_name = $4,
                parent_phone = $5,
                vaccination_status = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(child.id.as_uuid())
        .bind(&child.name)
        .bind(&child.gender)
        .bind(&child.parent_name)
        .bind(&child.parent_phone)
        .bind(child.vaccination_status.code())
        .bind(child.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, query: &ListQuery) -> CareResult<(Vec<Child>, u64)> {
        let total = count(&self.pool, "children", &query.filter).await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {CHILD_COLUMNS} FROM children"));
        listing::sql::push_where(&mut select, &query.filter);
        listing::sql::push_order_and_page(&mut select, query);
        let rows = select
            .build_query_as::<ChildRow>()
            .fetch_all(&self.pool)
            .await?;

        let children = rows
            .into_iter()
            .map(ChildRow::into_child)
            .collect::<CareResult<Vec<_>>>()?;
        Ok((children, total))
    }
}

// ============================================================================
// Vaccination Repository Implementation
// ============================================================================

impl VaccinationRepository for PgCareRepository {
    async fn create(&self, vaccination: &Vaccination) -> CareResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vaccinations (
                id,
                child_id,
                vaccine_id,
                date,
                dose_number,
                status,
                region,
                district,
                health_center,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(vaccination.id.as_uuid())
        .bind(vaccination.child_id.as_uuid())
        .bind(vaccination.vaccine_id.as_uuid())
        .bind(vaccination.date)
        .bind(vaccination.dose_number)
        .bind(vaccination.status.code())
        .bind(&vaccination.location.region)
        .bind(&vaccination.location.district)
        .bind(&vaccination.location.health_center)
        .bind(vaccination.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &VaccinationId) -> CareResult<Option<Vaccination>> {
        let row = sqlx::query_as::<_, VaccinationRow>(&format!(
            "SELECT {VACCINATION_COLUMNS} FROM {VACCINATION_SOURCE} WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(VaccinationRow::into_vaccination).transpose()
    }

    async fn list(&self, query: &ListQuery) -> CareResult<(Vec<Vaccination>, u64)> {
        let total = count(&self.pool, VACCINATION_SOURCE, &query.filter).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {VACCINATION_COLUMNS} FROM {VACCINATION_SOURCE}"
        ));
        listing::sql::push_where(&mut select, &query.filter);
        listing::sql::push_order_and_page(&mut select, query);
        let rows = select
            .build_query_as::<VaccinationRow>()
            .fetch_all(&self.pool)
            .await?;

        let vaccinations = rows
            .into_iter()
            .map(VaccinationRow::into_vaccination)
            .collect::<CareResult<Vec<_>>>()?;
        Ok((vaccinations, total))
    }

    async fn list_for_child(&self, child_id: &ChildId) -> CareResult<Vec<Vaccination>> {
        let rows = sqlx::query_as::<_, VaccinationRow>(&format!(
            "SELECT {VACCINATION_COLUMNS} FROM {VACCINATION_SOURCE} WHERE child_id = $1 ORDER BY date"
        ))
        .bind(child_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(VaccinationRow::into_vaccination)
            .collect()
    }

    async fn update_status(
        &self,
        id: &VaccinationId,
        expected: DoseStatus,
        status: DoseStatus,
        date: NaiveDate,
    ) -> CareResult<Option<Vaccination>> {
        // Conditional on the current status so concurrent updates cannot both apply.
        let row = sqlx::query_as::<_, VaccinationRow>(
            r#"
            WITH updated AS (
                UPDATE vaccinations
                SET status = $2, date = $3
                WHERE id = $1 AND status = $4
                RETURNING *
            )
            SELECT
                u.id,
                u.child_id,
                u.vaccine_id,
                u.date,
                u.dose_number,
                u.status,
                u.region,
                u.district,
                u.health_center,
                u.created_at,
                c.name AS child_name,
                vc.name AS vaccine_name
            FROM updated u
            JOIN children c ON c.id = u.child_id
            JOIN vaccines vc ON vc.id = u.vaccine_id
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.code())
        .bind(date)
        .bind(expected.code())
        .fetch_optional(&self.pool)
        .await?;

        row.map(VaccinationRow::into_vaccination).transpose()
    }
}

// ============================================================================
// Dashboard Repository Implementation
// ============================================================================

impl DashboardRepository for PgCareRepository {
    async fn children_by_status(&self, filter: &Filter) -> CareResult<Vec<(CoverageStatus, u64)>> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT vaccination_status, COUNT(*) FROM children");
        listing::sql::push_where(&mut qb, filter);
        qb.push(" GROUP BY vaccination_status");
        let rows: Vec<(String, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .filter_map(|(code, n)| match CoverageStatus::from_code(&code) {
                Some(status) => Some((status, n.max(0) as u64)),
                None => {
                    tracing::warn!(status = %code, "Unknown vaccination status in children table");
                    None
                }
            })
            .collect())
    }

    async fn count_vaccinations(&self, filter: &Filter) -> CareResult<u64> {
        count(&self.pool, "vaccinations", filter).await
    }

    async fn vaccinations_per_month(
        &self,
        filter: &Filter,
        since: NaiveDate,
    ) -> CareResult<Vec<(NaiveDate, u64)>> {
        let filter = Filter::and([filter.clone(), Filter::date_range("date", Some(since), None)]);
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT date_trunc('month', date)::date AS month, COUNT(*) FROM vaccinations",
        );
        listing::sql::push_where(&mut qb, &filter);
        qb.push(" GROUP BY month ORDER BY month");
        let rows: Vec<(NaiveDate, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(month, n)| (month, n.max(0) as u64))
            .collect())
    }

    async fn vaccinations_grouped_by(
        &self,
        filter: &Filter,
        column: &'static str,
    ) -> CareResult<Vec<(String, u64)>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {column}, COUNT(*) AS n FROM vaccinations"
        ));
        listing::sql::push_where(&mut qb, filter);
        qb.push(if filter.is_all() { " WHERE " } else { " AND " })
            .push(column)
            .push(" IS NOT NULL GROUP BY ")
            .push(column)
            .push(" ORDER BY n DESC, ")
            .push(column)
            .push(" ASC");
        let rows: Vec<(String, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(key, n)| (key, n.max(0) as u64))
            .collect())
    }
}

// ============================================================================
// District Backfill
// ============================================================================

impl DistrictBackfill for PgCareRepository {
    async fn backfill_districts(&self) -> CareResult<BackfillReport> {
        let mut tx = self.pool.begin().await?;

        let mut report = BackfillReport::default();
        for (table, slot) in [
            ("children", &mut report.children),
            ("vaccinations", &mut report.vaccinations),
        ] {
            *slot = sqlx::query(&format!(
                "UPDATE {table} AS t SET district = {DISTRICT_FROM_HEALTH_CENTER} \
                 WHERE t.district IS NULL AND t.health_center IS NOT NULL"
            ))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(report)
    }
}

// ============================================================================
// Health Center Directory (for user administration)
// ============================================================================

impl auth::HealthCenterDirectory for PgCareRepository {
    async fn locate(&self, health_center: &str) -> auth::AuthResult<Option<Location>> {
        let center = HealthCenterRepository::find_by_name(self, health_center).await?;
        Ok(center.map(|c| c.location()))
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct HealthCenterRow {
    id: Uuid,
    name: String,
    region: String,
    kind: String,
    district_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl HealthCenterRow {
    fn into_center(self) -> CareResult<HealthCenter> {
        let kind = HealthCenterKind::from_code(&self.kind).ok_or_else(|| {
            CareError::Internal(format!("Invalid kind for health center {}: {}", self.id, self.kind))
        })?;
        Ok(HealthCenter {
            id: HealthCenterId::from_uuid(self.id),
            name: self.name,
            region: self.region,
            kind,
            district_name: self.district_name,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VaccineRow {
    id: Uuid,
    name: String,
    code: String,
    doses_required: i16,
}

impl VaccineRow {
    fn into_vaccine(self) -> Vaccine {
        Vaccine {
            id: VaccineId::from_uuid(self.id),
            name: self.name,
            code: self.code,
            doses_required: self.doses_required,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ChildRow {
    id: Uuid,
    name: String,
    birth_date: NaiveDate,
    gender: Option<String>,
    parent_name: String,
    parent_phone: String,
    region: Option<String>,
    district: Option<String>,
    health_center: Option<String>,
    vaccination_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChildRow {
    fn into_child(self) -> CareResult<Child> {
        let vaccination_status =
            CoverageStatus::from_code(&self.vaccination_status).ok_or_else(|| {
                CareError::Internal(format!(
                    "Invalid vaccination status for child {}: {}",
                    self.id, self.vaccination_status
                ))
            })?;
        Ok(Child {
            id: ChildId::from_uuid(self.id),
            name: self.name,
            birth_date: self.birth_date,
            gender: self.gender,
            parent_name: self.parent_name,
            parent_phone: self.parent_phone,
            location: Location::new(self.region, self.district, self.health_center),
            vaccination_status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VaccinationRow {
    id: Uuid,
    child_id: Uuid,
    vaccine_id: Uuid,
    date: NaiveDate,
    dose_number: i32,
    status: String,
    region: Option<String>,
    district: Option<String>,
    health_center: Option<String>,
    created_at: DateTime<Utc>,
    child_name: String,
    vaccine_name: String,
}

impl VaccinationRow {
    fn into_vaccination(self) -> CareResult<Vaccination> {
        let status = DoseStatus::from_code(&self.status).ok_or_else(|| {
            CareError::Internal(format!(
                "Invalid status for vaccination {}: {}",
                self.id, self.status
            ))
        })?;
        Ok(Vaccination {
            id: VaccinationId::from_uuid(self.id),
            child_id: ChildId::from_uuid(self.child_id),
            vaccine_id: VaccineId::from_uuid(self.vaccine_id),
            date: self.date,
            dose_number: self.dose_number,
            status,
            location: Location::new(self.region, self.district, self.health_center),
            child_name: self.child_name,
            vaccine_name: self.vaccine_name,
            created_at: self.created_at,
        })
    }
}
