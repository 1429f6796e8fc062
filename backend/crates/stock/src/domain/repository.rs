//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::StockTransferId;
use listing::{Filter, ListQuery};

use crate::domain::entities::{Resolution, StockTransfer};
use crate::error::StockResult;

#[trait_variant::make(TransferRepository: Send)]
pub trait LocalTransferRepository {
    async fn create(&self, transfer: &StockTransfer) -> StockResult<()>;

    async fn find_by_id(&self, id: &StockTransferId) -> StockResult<Option<StockTransfer>>;

    async fn list(&self, query: &ListQuery) -> StockResult<(Vec<StockTransfer>, u64)>;

    /// pending の場合に限り確定させる（比較と更新は不可分）
    ///
    /// 既に確定済み、または存在しない場合は `None`。
    async fn resolve_if_pending(
        &self,
        id: &StockTransferId,
        resolution: &Resolution,
    ) -> StockResult<Option<StockTransfer>>;

    async fn exists(&self, id: &StockTransferId) -> StockResult<bool>;

    async fn count(&self, filter: &Filter) -> StockResult<u64>;
}
