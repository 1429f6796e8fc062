//! Visibility filters derived from an access scope

use kernel::scope::AccessScope;

use crate::filter::Filter;

/// リソースごとの所在カラム
#[derive(Debug, Clone, Copy)]
pub struct ScopeColumns {
    pub region: &'static str,
    pub district: &'static str,
    pub health_center: &'static str,
}

/// スコープに応じた絞り込み
///
/// 国レベルは無制限。それ以外は該当カラムの完全一致で、
/// 値を持たないレコードは一致しません。
pub fn visibility_filter(scope: &AccessScope, columns: &ScopeColumns) -> Filter {
    match scope {
        AccessScope::National => Filter::All,
        AccessScope::Regional { region } => Filter::eq(columns.region, region.clone()),
        AccessScope::District { district } => Filter::eq(columns.district, district.clone()),
        AccessScope::Agent { health_center } => {
            Filter::eq(columns.health_center, health_center.clone())
        }
    }
}
