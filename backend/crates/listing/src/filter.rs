//! Filter AST
//!
//! A small boolean expression over named columns. Empty filters are dropped
//! when combining, so `Filter::and(vec![Filter::All, f])` is just `f`.

use chrono::{DateTime, NaiveDate, Utc};
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// 制限なし
    All,
    /// 完全一致
    Eq { column: &'static str, value: String },
    /// 大文字小文字を区別しない部分一致（いずれかのカラム）
    Search {
        columns: &'static [&'static str],
        term: String,
    },
    /// 日付範囲（開始・終了とも日単位で含む）
    DateRange {
        column: &'static str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    And(Vec<Filter>),
    Any(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<String>) -> Self {
        Filter::Eq {
            column,
            value: value.into(),
        }
    }

    /// 検索語が空なら [`Filter::All`]
    pub fn search(columns: &'static [&'static str], term: &str) -> Self {
        let term = term.trim();
        if term.is_empty() || columns.is_empty() {
            return Filter::All;
        }
        Filter::Search {
            columns,
            term: term.to_string(),
        }
    }

    /// 両端とも未指定なら [`Filter::All`]
    pub fn date_range(
        column: &'static str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Self {
        if start.is_none() && end.is_none() {
            return Filter::All;
        }
        Filter::DateRange { column, start, end }
    }

    /// AND 結合（空のフィルタは除外、入れ子の AND は平坦化）
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut parts = Vec::new();
        for filter in filters {
            match filter {
                Filter::All => {}
                Filter::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Filter::All,
            1 => parts.remove(0),
            _ => Filter::And(parts),
        }
    }

    /// OR 結合（いずれかが無制限なら全体も無制限）
    pub fn any(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut parts = Vec::new();
        for filter in filters {
            match filter {
                Filter::All => return Filter::All,
                other => parts.push(other),
            }
        }
        if parts.len() == 1 {
            return parts.remove(0);
        }
        Filter::Any(parts)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    /// メモリ上のレコードに対する評価
    pub fn matches<T: Filterable + ?Sized>(&self, record: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { column, value } => record
                .field(column)
                .as_text()
                .is_some_and(|text| text == value.as_str()),
            Filter::Search { columns, term } => {
                let needle = term.to_lowercase();
                columns.iter().any(|column| {
                    record
                        .field(column)
                        .as_text()
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                })
            }
            Filter::DateRange { column, start, end } => {
                let Some(date) = record.field(column).as_date() else {
                    return false;
                };
                start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
            }
            Filter::And(parts) => parts.iter().all(|f| f.matches(record)),
            Filter::Any(parts) => parts.iter().any(|f| f.matches(record)),
        }
    }
}

/// カラム値（メモリ上の評価・並び替え用）
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum FieldValue<'a> {
    Missing,
    Number(i64),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Text(Cow<'a, str>),
}

impl<'a> FieldValue<'a> {
    pub fn text(value: &'a str) -> Self {
        FieldValue::Text(Cow::Borrowed(value))
    }

    pub fn opt_text(value: Option<&'a str>) -> Self {
        value.map_or(FieldValue::Missing, FieldValue::text)
    }

    fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(s) => Some(Cow::Borrowed(s.as_ref())),
            FieldValue::Number(n) => Some(Cow::Owned(n.to_string())),
            _ => None,
        }
    }

    fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            FieldValue::Timestamp(t) => Some(t.date_naive()),
            _ => None,
        }
    }
}

/// カラム名で値を取り出せるレコード
pub trait Filterable {
    fn field(&self, column: &str) -> FieldValue<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        name: &'static str,
        district: Option<&'static str>,
        date: NaiveDate,
    }

    impl Filterable for Row {
        fn field(&self, column: &str) -> FieldValue<'_> {
            match column {
                "name" => FieldValue::text(self.name),
                "district" => FieldValue::opt_text(self.district),
                "date" => FieldValue::Date(self.date),
                _ => FieldValue::Missing,
            }
        }
    }

    fn row(name: &'static str, district: Option<&'static str>, day: u32) -> Row {
        Row {
            name,
            district,
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn and_drops_empty_filters() {
        assert_eq!(Filter::and(vec![Filter::All, Filter::All]), Filter::All);
        let only = Filter::eq("district", "Centre A");
        assert_eq!(Filter::and(vec![Filter::All, only.clone()]), only);
        assert_eq!(Filter::and(vec![Filter::search(&["name"], "   "), only.clone()]), only);
    }

    #[test]
    fn and_flattens_nested_conjunctions() {
        let inner = Filter::and(vec![Filter::eq("a", "1"), Filter::eq("b", "2")]);
        let outer = Filter::and(vec![inner, Filter::eq("c", "3")]);
        assert!(matches!(outer, Filter::And(ref parts) if parts.len() == 3));
    }

    #[test]
    fn any_with_unrestricted_branch_is_unrestricted() {
        assert_eq!(
            Filter::any(vec![Filter::eq("a", "1"), Filter::All]),
            Filter::All
        );
    }

    #[test]
    fn search_is_case_insensitive_across_columns() {
        let filter = Filter::search(&["name", "district"], "cEnTrE");
        assert!(filter.matches(&row("Amina", Some("Centre A"), 1)));
        assert!(!filter.matches(&row("Amina", None, 1)));
    }

    #[test]
    fn date_range_is_inclusive_on_both_days() {
        let filter = Filter::date_range("date", Some(d(5)), Some(d(10)));
        assert!(!filter.matches(&row("x", None, 4)));
        assert!(filter.matches(&row("x", None, 5)));
        assert!(filter.matches(&row("x", None, 10)));
        assert!(!filter.matches(&row("x", None, 11)));
    }

    #[test]
    fn timestamps_on_end_day_are_included() {
        struct Stamp(DateTime<Utc>);
        impl Filterable for Stamp {
            fn field(&self, _: &str) -> FieldValue<'_> {
                FieldValue::Timestamp(self.0)
            }
        }
        let late = d(10).and_hms_opt(23, 59, 59).unwrap().and_utc();
        let filter = Filter::date_range("created_at", None, Some(d(10)));
        assert!(filter.matches(&Stamp(late)));
    }

    #[test]
    fn missing_column_never_equals() {
        let filter = Filter::eq("district", "Centre A");
        assert!(filter.matches(&row("x", Some("Centre A"), 1)));
        assert!(!filter.matches(&row("x", None, 1)));
    }
}
