//! List Transfers Use Case

use std::sync::Arc;

use kernel::id::StockTransferId;
use kernel::scope::AccessScope;
use listing::{ListQuery, ResourceSchema, StatusField};

use crate::domain::entities::StockTransfer;
use crate::domain::repository::TransferRepository;
use crate::domain::services::{is_visible, pending_in, transfer_visibility};
use crate::domain::value_objects::TransferStatus;
use crate::error::{StockError, StockResult};

pub const TRANSFER_SCHEMA: ResourceSchema = ResourceSchema {
    sortable: &[
        ("createdAt", "created_at"),
        ("quantity", "quantity"),
        ("vaccine", "vaccine"),
        ("status", "status"),
    ],
    default_sort: "createdAt",
    searchable: &["vaccine", "batch_number"],
    date_column: Some("created_at"),
    status: Some(StatusField {
        column: "status",
        allowed: TransferStatus::CODES,
    }),
};

pub struct ListTransfersUseCase<T>
where
    T: TransferRepository,
{
    transfers: Arc<T>,
}

impl<T> ListTransfersUseCase<T>
where
    T: TransferRepository,
{
    pub fn new(transfers: Arc<T>) -> Self {
        Self { transfers }
    }

    pub async fn list(
        &self,
        scope: &AccessScope,
        query: ListQuery,
    ) -> StockResult<(Vec<StockTransfer>, u64)> {
        let query = query.restrict(transfer_visibility(scope));
        self.transfers.list(&query).await
    }

    pub async fn get(&self, scope: &AccessScope, id: &StockTransferId) -> StockResult<StockTransfer> {
        self.transfers
            .find_by_id(id)
            .await?
            .filter(|t| is_visible(scope, t))
            .ok_or(StockError::NotFound)
    }

    pub async fn count_pending(&self, scope: &AccessScope) -> StockResult<u64> {
        self.transfers.count(&pending_in(scope)).await
    }
}
