//! Domain Entities

use chrono::{DateTime, Utc};
use kernel::id::{StockTransferId, UserId};
use kernel::scope::{Level, Location};
use listing::{FieldValue, Filterable};

use crate::domain::value_objects::TransferStatus;

/// 在庫移送（1 段下の階層への払い出し）
#[derive(Debug, Clone)]
pub struct StockTransfer {
    pub id: StockTransferId,
    pub vaccine: String,
    pub batch_number: String,
    pub quantity: i32,
    pub from_level: Level,
    pub from: Location,
    pub to_level: Level,
    pub to: Location,
    pub status: TransferStatus,
    /// 却下理由
    pub reason: Option<String>,
    pub created_by: UserId,
    pub resolved_by: Option<UserId>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 送り元・送り先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub level: Level,
    pub location: Location,
}

impl StockTransfer {
    pub fn new(
        vaccine: String,
        batch_number: String,
        quantity: i32,
        from: Endpoint,
        to: Endpoint,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: StockTransferId::new(),
            vaccine,
            batch_number,
            quantity,
            from_level: from.level,
            from: from.location,
            to_level: to.level,
            to: to.location,
            status: TransferStatus::Pending,
            reason: None,
            created_by,
            resolved_by: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 確定後の値を適用（状態の検査は呼び出し側・リポジトリ側で行う）
    pub fn apply(&mut self, resolution: &Resolution) {
        self.status = resolution.status;
        self.reason = resolution.reason.clone();
        self.resolved_by = Some(resolution.resolved_by);
        self.resolved_at = Some(resolution.resolved_at);
        self.updated_at = resolution.resolved_at;
    }
}

/// pending の移送を確定させる書き込み内容
#[derive(Debug, Clone)]
pub struct Resolution {
    pub status: TransferStatus,
    pub reason: Option<String>,
    pub resolved_by: UserId,
    pub resolved_at: DateTime<Utc>,
}

impl Filterable for StockTransfer {
    fn field(&self, column: &str) -> FieldValue<'_> {
        match column {
            "vaccine" => FieldValue::text(&self.vaccine),
            "batch_number" => FieldValue::text(&self.batch_number),
            "quantity" => FieldValue::Number(i64::from(self.quantity)),
            "status" => FieldValue::text(self.status.code()),
            "from_level" => FieldValue::text(self.from_level.code()),
            "to_level" => FieldValue::text(self.to_level.code()),
            "from_region" => FieldValue::opt_text(self.from.region.as_deref()),
            "from_district" => FieldValue::opt_text(self.from.district.as_deref()),
            "from_health_center" => FieldValue::opt_text(self.from.health_center.as_deref()),
            "to_region" => FieldValue::opt_text(self.to.region.as_deref()),
            "to_district" => FieldValue::opt_text(self.to.district.as_deref()),
            "to_health_center" => FieldValue::opt_text(self.to.health_center.as_deref()),
            "created_at" => FieldValue::Timestamp(self.created_at),
            _ => FieldValue::Missing,
        }
    }
}
