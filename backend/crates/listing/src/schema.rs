//! Resource schemas
//!
//! Column names only ever come from these static declarations; user input is
//! mapped onto them and never interpolated into SQL.

/// ステータス絞り込みの定義
#[derive(Debug, Clone, Copy)]
pub struct StatusField {
    pub column: &'static str,
    pub allowed: &'static [&'static str],
}

/// 一覧対象リソースの定義
#[derive(Debug, Clone, Copy)]
pub struct ResourceSchema {
    /// (API のフィールド名, カラム名)
    pub sortable: &'static [(&'static str, &'static str)],
    /// 既定のソートフィールド（API 名）
    pub default_sort: &'static str,
    /// テキスト検索の対象カラム
    pub searchable: &'static [&'static str],
    /// 日付範囲の対象カラム
    pub date_column: Option<&'static str>,
    pub status: Option<StatusField>,
}

impl ResourceSchema {
    /// API のフィールド名をカラム名へ
    pub fn sort_column(&self, field: &str) -> Option<&'static str> {
        self.sortable
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
    }

    pub(crate) fn sortable_names(&self) -> String {
        self.sortable
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
