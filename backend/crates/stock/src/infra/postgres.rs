//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use kernel::id::{StockTransferId, UserId};
use kernel::scope::{AccessScope, Level, Location};
use listing::{Filter, ListQuery};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::entities::{Resolution, StockTransfer};
use crate::domain::repository::TransferRepository;
use crate::domain::services::pending_in;
use crate::domain::value_objects::TransferStatus;
use crate::error::{StockError, StockResult};

const TRANSFER_COLUMNS: &str = r#"
    id,
    vaccine,
    batch_number,
    quantity,
    from_level,
    from_region,
    from_district,
    from_health_center,
    to_level,
    to_region,
    to_district,
    to_health_center,
    status,
    reason,
    created_by,
    resolved_by,
    resolved_at,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed stock repository
#[derive(Clone)]
pub struct PgStockRepository {
    pool: PgPool,
}

impl PgStockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TransferRepository for PgStockRepository {
    async fn create(&self, transfer: &StockTransfer) -> StockResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_transfers (
                id, vaccine, batch_number, quantity,
                from_level, from_region, from_district, from_health_center,
                to_level, to_region, to_district, to_health_center,
                status, reason, created_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(transfer.id.as_uuid())
        .bind(&transfer.vaccine)
        .bind(&transfer.batch_number)
        .bind(transfer.quantity)
        .bind(transfer.from_level.code())
        .bind(&transfer.from.region)
        .bind(&transfer.from.district)
        .bind(&transfer.from.health_center)
        .bind(transfer.to_level.code())
        .bind(&transfer.to.region)
        .bind(&transfer.to.district)
        .bind(&transfer.to.health_center)
        .bind(transfer.status.code())
        .bind(&transfer.reason)
        .bind(transfer.created_by.as_uuid())
        .bind(transfer.created_at)
        .bind(transfer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &StockTransferId) -> StockResult<Option<StockTransfer>> {
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM stock_transfers WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransferRow::into_transfer).transpose()
    }

    async fn list(&self, query: &ListQuery) -> StockResult<(Vec<StockTransfer>, u64)> {
        let total = self.count(&query.filter).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TRANSFER_COLUMNS} FROM stock_transfers"
        ));
        listing::sql::push_where(&mut select, &query.filter);
        listing::sql::push_order_and_page(&mut select, query);
        let rows = select
            .build_query_as::<TransferRow>()
            .fetch_all(&self.pool)
            .await?;

        let transfers = rows
            .into_iter()
            .map(TransferRow::into_transfer)
            .collect::<StockResult<Vec<_>>>()?;
        Ok((transfers, total))
    }

    async fn resolve_if_pending(
        &self,
        id: &StockTransferId,
        resolution: &Resolution,
    ) -> StockResult<Option<StockTransfer>> {
        // The status guard makes the check and the write a single statement.
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            UPDATE stock_transfers
            SET status = $2, reason = $3, resolved_by = $4, resolved_at = $5, updated_at = $5
            WHERE id = $1 AND status = 'pending'
            RETURNING {TRANSFER_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(resolution.status.code())
        .bind(&resolution.reason)
        .bind(resolution.resolved_by.as_uuid())
        .bind(resolution.resolved_at)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_none() {
            tracing::debug!(transfer_id = %id, "Transfer was not pending at update time");
        }
        row.map(TransferRow::into_transfer).transpose()
    }

    async fn exists(&self, id: &StockTransferId) -> StockResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stock_transfers WHERE id = $1)",
        )
        .bind(id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn count(&self, filter: &Filter) -> StockResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM stock_transfers");
        listing::sql::push_where(&mut qb, filter);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }
}

impl care::PendingTransferCounter for PgStockRepository {
    async fn count_pending(&self, scope: &AccessScope) -> care::CareResult<u64> {
        Ok(TransferRepository::count(self, &pending_in(scope)).await?)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct TransferRow {
    id: Uuid,
    vaccine: String,
    batch_number: String,
    quantity: i32,
    from_level: String,
    from_region: Option<String>,
    from_district: Option<String>,
    from_health_center: Option<String>,
    to_level: String,
    to_region: Option<String>,
    to_district: Option<String>,
    to_health_center: Option<String>,
    status: String,
    reason: Option<String>,
    created_by: Uuid,
    resolved_by: Option<Uuid>,
    resolved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransferRow {
    fn into_transfer(self) -> StockResult<StockTransfer> {
        let id = self.id;
        let level = |code: &str| {
            Level::from_code(code).map_err(|e| {
                StockError::Internal(format!("Invalid level for transfer {id}: {e}"))
            })
        };
        let status = TransferStatus::from_code(&self.status).ok_or_else(|| {
            StockError::Internal(format!("Invalid status for transfer {id}: {}", self.status))
        })?;

        Ok(StockTransfer {
            id: StockTransferId::from_uuid(self.id),
            vaccine: self.vaccine,
            batch_number: self.batch_number,
            quantity: self.quantity,
            from_level: level(&self.from_level)?,
            from: Location::new(self.from_region, self.from_district, self.from_health_center),
            to_level: level(&self.to_level)?,
            to: Location::new(self.to_region, self.to_district, self.to_health_center),
            status,
            reason: self.reason,
            created_by: UserId::from_uuid(self.created_by),
            resolved_by: self.resolved_by.map(UserId::from_uuid),
            resolved_at: self.resolved_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
