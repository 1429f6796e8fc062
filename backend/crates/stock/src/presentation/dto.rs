//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::{StockTransferId, UserId};
use kernel::scope::Level;
use serde::{Deserialize, Serialize};

use crate::domain::entities::StockTransfer;
use crate::domain::value_objects::TransferStatus;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub id: StockTransferId,
    pub vaccine: String,
    pub batch_number: String,
    pub quantity: i32,
    pub from_level: Level,
    pub from_region: Option<String>,
    pub from_district: Option<String>,
    pub from_health_center: Option<String>,
    pub to_level: Level,
    pub to_region: Option<String>,
    pub to_district: Option<String>,
    pub to_health_center: Option<String>,
    pub status: TransferStatus,
    pub reason: Option<String>,
    pub created_by: UserId,
    pub resolved_by: Option<UserId>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StockTransfer> for TransferResponse {
    fn from(t: StockTransfer) -> Self {
        Self {
            id: t.id,
            vaccine: t.vaccine,
            batch_number: t.batch_number,
            quantity: t.quantity,
            from_level: t.from_level,
            from_region: t.from.region,
            from_district: t.from.district,
            from_health_center: t.from.health_center,
            to_level: t.to_level,
            to_region: t.to.region,
            to_district: t.to.district,
            to_health_center: t.to.health_center,
            status: t.status,
            reason: t.reason,
            created_by: t.created_by,
            resolved_by: t.resolved_by,
            resolved_at: t.resolved_at,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    #[serde(default)]
    pub vaccine: String,
    #[serde(default)]
    pub batch_number: String,
    pub quantity: i64,
    pub to_level: Level,
    pub to_region: Option<String>,
    pub to_district: Option<String>,
    pub to_health_center: Option<String>,
}

/// PATCH /api/stocks/transfers/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTransferRequest {
    pub status: TransferStatus,
    pub reason: Option<String>,
}

/// accept / reject / cancel の任意ボディ
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveTransferRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCountResponse {
    pub pending_transfers: u64,
}
