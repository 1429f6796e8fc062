//! HTTP Handlers
//!
//! Every handler expects `Principal` and `AccessScope` in the request
//! extensions (see [`crate::presentation::middleware`]).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use kernel::id::{ChildId, HealthCenterId, VaccinationId};
use kernel::scope::{AccessScope, Principal};
use listing::{ListQuery, Paginated, RawListQuery};
use platform::events::EventBus;
use std::sync::Arc;

use crate::application::{
    CHILD_SCHEMA, ChildrenUseCase, CreateHealthCenterInput, DashboardSummary, DashboardUseCase,
    HEALTH_CENTER_SCHEMA, HealthCentersUseCase, RecordVaccinationInput, RegisterChildInput,
    UpdateVaccinationInput, VACCINATION_SCHEMA, VaccinationsUseCase, VaccineCatalogueUseCase,
};
use crate::domain::entity::vaccine::Vaccine;
use crate::domain::repository::{CareStore, PendingTransferCounter};
use crate::error::CareResult;
use crate::presentation::dto::{
    ChildResponse, CreateChildRequest, CreateHealthCenterRequest, CreateVaccinationRequest,
    HealthCenterResponse, UpdateVaccinationRequest, VaccinationResponse,
};

/// Shared state for care handlers
#[derive(Clone)]
pub struct CareAppState<R, T>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub transfers: Arc<T>,
    pub events: EventBus,
}

impl<R, T> CareAppState<R, T>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    fn children(&self) -> ChildrenUseCase<R, R> {
        ChildrenUseCase::new(self.repo.clone(), self.repo.clone(), self.events.clone())
    }

    fn vaccinations(&self) -> VaccinationsUseCase<R, R, R, R> {
        VaccinationsUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.repo.clone(),
            self.repo.clone(),
            self.events.clone(),
        )
    }
}

// ============================================================================
// Health centers
// ============================================================================

/// GET /api/health-centers
pub async fn list_health_centers<R, T>(
    State(state): State<CareAppState<R, T>>,
    Extension(scope): Extension<AccessScope>,
    Query(raw): Query<RawListQuery>,
) -> CareResult<Json<Paginated<HealthCenterResponse>>>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let query = ListQuery::parse(&raw, &HEALTH_CENTER_SCHEMA)?;
    let (centers, total) = HealthCentersUseCase::new(state.repo.clone())
        .list(&scope, query.clone())
        .await?;

    Ok(Json(
        Paginated::new(centers, &query, total).map(HealthCenterResponse::from),
    ))
}

/// GET /api/health-centers/{id}
pub async fn get_health_center<R, T>(
    State(state): State<CareAppState<R, T>>,
    Extension(scope): Extension<AccessScope>,
    Path(id): Path<HealthCenterId>,
) -> CareResult<Json<HealthCenterResponse>>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let center = HealthCentersUseCase::new(state.repo.clone())
        .get(&scope, &id)
        .await?;
    Ok(Json(center.into()))
}

/// POST /api/health-centers
pub async fn create_health_center<R, T>(
    State(state): State<CareAppState<R, T>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Json(req): Json<CreateHealthCenterRequest>,
) -> CareResult<(StatusCode, Json<HealthCenterResponse>)>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let input = CreateHealthCenterInput {
        name: req.name,
        region: req.region,
        kind: req.kind,
        district_name: req.district_name,
    };
    let center = HealthCentersUseCase::new(state.repo.clone())
        .create(&principal, &scope, input)
        .await?;

    Ok((StatusCode::CREATED, Json(center.into())))
}

// ============================================================================
// Vaccines
// ============================================================================

/// GET /api/vaccines
pub async fn list_vaccines<R, T>(
    State(state): State<CareAppState<R, T>>,
) -> CareResult<Json<Vec<Vaccine>>>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let vaccines = VaccineCatalogueUseCase::new(state.repo.clone()).list().await?;
    Ok(Json(vaccines))
}

// ============================================================================
// Children
// ============================================================================

/// GET /api/children
pub async fn list_children<R, T>(
    State(state): State<CareAppState<R, T>>,
    Extension(scope): Extension<AccessScope>,
    Query(raw): Query<RawListQuery>,
) -> CareResult<Json<Paginated<ChildResponse>>>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let query = ListQuery::parse(&raw, &CHILD_SCHEMA)?;
    let (children, total) = state.children().list(&scope, query.clone()).await?;

    Ok(Json(
        Paginated::new(children, &query, total).map(ChildResponse::from),
    ))
}

/// GET /api/children/{id}
pub async fn get_child<R, T>(
    State(state): State<CareAppState<R, T>>,
    Extension(scope): Extension<AccessScope>,
    Path(id): Path<ChildId>,
) -> CareResult<Json<ChildResponse>>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let child = state.children().get(&scope, &id).await?;
    Ok(Json(child.into()))
}

/// POST /api/children
pub async fn create_child<R, T>(
    State(state): State<CareAppState<R, T>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Json(req): Json<CreateChildRequest>,
) -> CareResult<(StatusCode, Json<ChildResponse>)>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let input = RegisterChildInput {
        name: req.name,
        birth_date: req.birth_date,
        gender: req.gender,
        parent_name: req.parent_name,
        parent_phone: req.parent_phone,
        health_center: req.health_center,
    };
    let child = state.children().register(&principal, &scope, input).await?;

    Ok((StatusCode::CREATED, Json(child.into())))
}

// ============================================================================
// Vaccinations
// ============================================================================

/// GET /api/vaccinations
pub async fn list_vaccinations<R, T>(
    State(state): State<CareAppState<R, T>>,
    Extension(scope): Extension<AccessScope>,
    Query(raw): Query<RawListQuery>,
) -> CareResult<Json<Paginated<VaccinationResponse>>>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let query = ListQuery::parse(&raw, &VACCINATION_SCHEMA)?;
    let (vaccinations, total) = state.vaccinations().list(&scope, query.clone()).await?;

    Ok(Json(
        Paginated::new(vaccinations, &query, total).map(VaccinationResponse::from),
    ))
}

/// GET /api/vaccinations/{id}
pub async fn get_vaccination<R, T>(
    State(state): State<CareAppState<R, T>>,
    Extension(scope): Extension<AccessScope>,
    Path(id): Path<VaccinationId>,
) -> CareResult<Json<VaccinationResponse>>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let vaccination = state.vaccinations().get(&scope, &id).await?;
    Ok(Json(vaccination.into()))
}

/// POST /api/vaccinations
pub async fn create_vaccination<R, T>(
    State(state): State<CareAppState<R, T>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Json(req): Json<CreateVaccinationRequest>,
) -> CareResult<(StatusCode, Json<VaccinationResponse>)>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let input = RecordVaccinationInput {
        child_id: req.child_id,
        vaccine_id: req.vaccine_id,
        date: req.date,
        dose_number: req.dose_number,
        status: req.status,
        health_center: req.health_center,
    };
    let vaccination = state
        .vaccinations()
        .record(&principal, &scope, input)
        .await?;

    Ok((StatusCode::CREATED, Json(vaccination.into())))
}

/// PATCH /api/vaccinations/{id}
pub async fn update_vaccination<R, T>(
    State(state): State<CareAppState<R, T>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Path(id): Path<VaccinationId>,
    Json(req): Json<UpdateVaccinationRequest>,
) -> CareResult<Json<VaccinationResponse>>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let input = UpdateVaccinationInput {
        status: req.status,
        date: req.date,
    };
    let vaccination = state
        .vaccinations()
        .update_status(&principal, &scope, &id, input)
        .await?;

    Ok(Json(vaccination.into()))
}

// ============================================================================
// Dashboard
// ============================================================================

/// GET /api/dashboard
pub async fn dashboard<R, T>(
    State(state): State<CareAppState<R, T>>,
    Extension(scope): Extension<AccessScope>,
) -> CareResult<Json<DashboardSummary>>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let summary = DashboardUseCase::new(state.repo.clone(), state.transfers.clone())
        .summary(&scope)
        .await?;
    Ok(Json(summary))
}

/// GET /api/dashboard/{level}
pub async fn dashboard_for_level<R, T>(
    State(state): State<CareAppState<R, T>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Path(level): Path<String>,
) -> CareResult<Json<DashboardSummary>>
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let summary = DashboardUseCase::new(state.repo.clone(), state.transfers.clone())
        .for_level(&principal, &scope, &level)
        .await?;
    Ok(Json(summary))
}
