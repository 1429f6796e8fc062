//! HTTP Handlers

use std::sync::Arc;

use auth::HealthCenterDirectory;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use kernel::id::StockTransferId;
use kernel::scope::{AccessScope, Principal};
use listing::{ListQuery, Paginated, RawListQuery};
use platform::events::EventBus;

use crate::application::{
    CreateTransferInput, CreateTransferUseCase, ListTransfersUseCase, ResolveTransferUseCase,
    TRANSFER_SCHEMA,
};
use crate::domain::repository::TransferRepository;
use crate::domain::value_objects::TransferAction;
use crate::error::{StockError, StockResult};
use crate::presentation::dto::{
    CreateTransferRequest, PendingCountResponse, ResolveTransferRequest, TransferResponse,
    UpdateTransferRequest,
};

/// Shared state for stock handlers
#[derive(Clone)]
pub struct StockAppState<T, D>
where
    T: TransferRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    pub transfers: Arc<T>,
    pub directory: Arc<D>,
    pub events: EventBus,
}

impl<T, D> StockAppState<T, D>
where
    T: TransferRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    fn resolver(&self) -> ResolveTransferUseCase<T> {
        ResolveTransferUseCase::new(self.transfers.clone(), self.events.clone())
    }
}

/// GET /api/stocks/transfers
pub async fn list_transfers<T, D>(
    State(state): State<StockAppState<T, D>>,
    Extension(scope): Extension<AccessScope>,
    Query(raw): Query<RawListQuery>,
) -> StockResult<Json<Paginated<TransferResponse>>>
where
    T: TransferRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    let query = ListQuery::parse(&raw, &TRANSFER_SCHEMA)?;
    let (transfers, total) = ListTransfersUseCase::new(state.transfers.clone())
        .list(&scope, query.clone())
        .await?;

    Ok(Json(
        Paginated::new(transfers, &query, total).map(TransferResponse::from),
    ))
}

/// GET /api/stocks/transfers/pending-count
pub async fn pending_count<T, D>(
    State(state): State<StockAppState<T, D>>,
    Extension(scope): Extension<AccessScope>,
) -> StockResult<Json<PendingCountResponse>>
where
    T: TransferRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    let pending_transfers = ListTransfersUseCase::new(state.transfers.clone())
        .count_pending(&scope)
        .await?;
    Ok(Json(PendingCountResponse { pending_transfers }))
}

/// GET /api/stocks/transfers/{id}
pub async fn get_transfer<T, D>(
    State(state): State<StockAppState<T, D>>,
    Extension(scope): Extension<AccessScope>,
    Path(id): Path<StockTransferId>,
) -> StockResult<Json<TransferResponse>>
where
    T: TransferRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    let transfer = ListTransfersUseCase::new(state.transfers.clone())
        .get(&scope, &id)
        .await?;
    Ok(Json(transfer.into()))
}

/// POST /api/stocks/transfers
pub async fn create_transfer<T, D>(
    State(state): State<StockAppState<T, D>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Json(req): Json<CreateTransferRequest>,
) -> StockResult<(StatusCode, Json<TransferResponse>)>
where
    T: TransferRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    let input = CreateTransferInput {
        vaccine: req.vaccine,
        batch_number: req.batch_number,
        quantity: req.quantity,
        to_level: req.to_level,
        to_region: req.to_region,
        to_district: req.to_district,
        to_health_center: req.to_health_center,
    };
    let transfer = CreateTransferUseCase::new(
        state.transfers.clone(),
        state.directory.clone(),
        state.events.clone(),
    )
    .execute(&principal, &scope, input)
    .await?;

    Ok((StatusCode::CREATED, Json(transfer.into())))
}

/// PATCH /api/stocks/transfers/{id}
pub async fn update_transfer<T, D>(
    State(state): State<StockAppState<T, D>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Path(id): Path<StockTransferId>,
    Json(req): Json<UpdateTransferRequest>,
) -> StockResult<Json<TransferResponse>>
where
    T: TransferRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    let transfer = state
        .resolver()
        .to_status(&principal, &scope, &id, req.status, req.reason)
        .await?;
    Ok(Json(transfer.into()))
}

/// 本文なし、または `{"reason": ...}`
fn optional_reason(body: &Bytes) -> StockResult<Option<String>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let req: ResolveTransferRequest = serde_json::from_slice(body)
        .map_err(|e| StockError::InvalidInput(format!("Invalid request body: {e}")))?;
    Ok(req.reason)
}

async fn resolve<T, D>(
    state: StockAppState<T, D>,
    principal: Principal,
    scope: AccessScope,
    id: StockTransferId,
    action: TransferAction,
    body: Bytes,
) -> StockResult<Json<TransferResponse>>
where
    T: TransferRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    let reason = optional_reason(&body)?;
    let transfer = state
        .resolver()
        .execute(&principal, &scope, &id, action, reason)
        .await?;
    Ok(Json(transfer.into()))
}

/// POST /api/stocks/transfers/{id}/accept
pub async fn accept_transfer<T, D>(
    State(state): State<StockAppState<T, D>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Path(id): Path<StockTransferId>,
    body: Bytes,
) -> StockResult<Json<TransferResponse>>
where
    T: TransferRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    resolve(state, principal, scope, id, TransferAction::Accept, body).await
}

/// POST /api/stocks/transfers/{id}/reject
pub async fn reject_transfer<T, D>(
    State(state): State<StockAppState<T, D>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Path(id): Path<StockTransferId>,
    body: Bytes,
) -> StockResult<Json<TransferResponse>>
where
    T: TransferRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    resolve(state, principal, scope, id, TransferAction::Reject, body).await
}

/// POST /api/stocks/transfers/{id}/cancel
pub async fn cancel_transfer<T, D>(
    State(state): State<StockAppState<T, D>>,
    Extension(principal): Extension<Principal>,
    Extension(scope): Extension<AccessScope>,
    Path(id): Path<StockTransferId>,
    body: Bytes,
) -> StockResult<Json<TransferResponse>>
where
    T: TransferRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    resolve(state, principal, scope, id, TransferAction::Cancel, body).await
}
