//! Vaccine Entity

use kernel::id::VaccineId;
use serde::Serialize;

/// ワクチンのカタログ項目
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vaccine {
    pub id: VaccineId,
    pub name: String,
    /// 短縮コード（例: BCG, VPO）
    pub code: String,
    pub doses_required: i16,
}
