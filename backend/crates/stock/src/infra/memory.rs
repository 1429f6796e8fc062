//! In-memory repository used by unit tests

use std::sync::{Arc, Mutex, MutexGuard};

use kernel::id::StockTransferId;
use kernel::scope::AccessScope;
use listing::{Filter, ListQuery, paginate_in_memory};

use crate::domain::entities::{Resolution, StockTransfer};
use crate::domain::repository::TransferRepository;
use crate::domain::services::pending_in;
use crate::domain::value_objects::TransferStatus;
use crate::error::StockResult;

#[derive(Clone, Default)]
pub struct MemoryTransferRepository {
    transfers: Arc<Mutex<Vec<StockTransfer>>>,
}

impl MemoryTransferRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StockTransfer>> {
        self.transfers.lock().unwrap()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

impl TransferRepository for MemoryTransferRepository {
    async fn create(&self, transfer: &StockTransfer) -> StockResult<()> {
        self.lock().push(transfer.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &StockTransferId) -> StockResult<Option<StockTransfer>> {
        Ok(self.lock().iter().find(|t| &t.id == id).cloned())
    }

    async fn list(&self, query: &ListQuery) -> StockResult<(Vec<StockTransfer>, u64)> {
        Ok(paginate_in_memory(&self.lock(), query))
    }

    async fn resolve_if_pending(
        &self,
        id: &StockTransferId,
        resolution: &Resolution,
    ) -> StockResult<Option<StockTransfer>> {
        let mut transfers = self.lock();
        Ok(transfers
            .iter_mut()
            .find(|t| &t.id == id && t.status == TransferStatus::Pending)
            .map(|t| {
                t.apply(resolution);
                t.clone()
            }))
    }

    async fn exists(&self, id: &StockTransferId) -> StockResult<bool> {
        Ok(self.lock().iter().any(|t| &t.id == id))
    }

    async fn count(&self, filter: &Filter) -> StockResult<u64> {
        Ok(self.lock().iter().filter(|t| filter.matches(*t)).count() as u64)
    }
}

impl care::PendingTransferCounter for MemoryTransferRepository {
    async fn count_pending(&self, scope: &AccessScope) -> care::CareResult<u64> {
        Ok(TransferRepository::count(self, &pending_in(scope)).await?)
    }
}
