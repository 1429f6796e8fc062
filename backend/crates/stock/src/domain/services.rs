//! Domain Services
//!
//! Pure rules for who may see, create and resolve a transfer.

use kernel::scope::{AccessScope, Principal};
use listing::{Filter, ScopeColumns, visibility_filter};

use crate::domain::entities::{Endpoint, StockTransfer};
use crate::domain::value_objects::{TransferAction, TransferStatus};
use crate::error::{StockError, StockResult};

pub const FROM_COLUMNS: ScopeColumns = ScopeColumns {
    region: "from_region",
    district: "from_district",
    health_center: "from_health_center",
};

pub const TO_COLUMNS: ScopeColumns = ScopeColumns {
    region: "to_region",
    district: "to_district",
    health_center: "to_health_center",
};

/// 送り元か送り先のどちらかが範囲内なら見える
pub fn transfer_visibility(scope: &AccessScope) -> Filter {
    Filter::any([
        visibility_filter(scope, &FROM_COLUMNS),
        visibility_filter(scope, &TO_COLUMNS),
    ])
}

pub fn is_visible(scope: &AccessScope, transfer: &StockTransfer) -> bool {
    scope.covers(&transfer.from) || scope.covers(&transfer.to)
}

/// 作成できるのは 1 段下の階層で、範囲内の送り先のみ
pub fn authorize_creation(
    principal: &Principal,
    scope: &AccessScope,
    to: &Endpoint,
) -> StockResult<()> {
    let Some(next) = principal.level.below() else {
        return Err(StockError::Forbidden(format!(
            "{} users cannot create transfers",
            principal.level
        )));
    };
    if to.level != next {
        return Err(StockError::InvalidInput(format!(
            "A {} transfer must go to the {next} level",
            principal.level
        )));
    }
    if !scope.covers(&to.location) {
        return Err(StockError::Forbidden(
            "The destination is outside your area".into(),
        ));
    }
    Ok(())
}

/// accept / reject は送り先、cancel は送り元の階層と範囲が必要
pub fn authorize_resolution(
    principal: &Principal,
    scope: &AccessScope,
    transfer: &StockTransfer,
    action: TransferAction,
) -> StockResult<()> {
    let (level, location) = if action.is_receiver_side() {
        (transfer.to_level, &transfer.to)
    } else {
        (transfer.from_level, &transfer.from)
    };
    if principal.level != level || !scope.covers(location) {
        return Err(StockError::Forbidden(format!(
            "Only the {} side of this transfer can {action} it",
            if action.is_receiver_side() { "receiving" } else { "sending" }
        )));
    }
    Ok(())
}

/// 現在の状態から `target` への遷移を検査
pub fn check_transition(current: TransferStatus, target: TransferStatus) -> StockResult<()> {
    if target == TransferStatus::Pending {
        return Err(StockError::InvalidTransition(
            "A transfer cannot be moved back to pending".into(),
        ));
    }
    if !current.can_transition_to(target) {
        return Err(StockError::AlreadyResolved);
    }
    Ok(())
}

/// 範囲内で未処理の移送
pub fn pending_in(scope: &AccessScope) -> Filter {
    Filter::and([
        transfer_visibility(scope),
        Filter::eq("status", TransferStatus::Pending.code()),
    ])
}
