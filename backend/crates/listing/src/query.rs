//! List query parsing and validation

use chrono::NaiveDate;
use kernel::error::app_error::AppError;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::filter::Filter;
use crate::schema::ResourceSchema;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// クエリ文字列そのまま（型変換は検証時に行う）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// 検証エラー一覧
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationErrors(pub Vec<String>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::validation(errors.0)
    }
}

/// 検証済みの一覧指定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub sort_column: &'static str,
    pub order: SortOrder,
    pub filter: Filter,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_column: "created_at",
            order: SortOrder::Desc,
            filter: Filter::All,
        }
    }
}

impl ListQuery {
    /// 生のクエリを検証して一覧指定を作る
    ///
    /// 全項目を検証し、問題があればすべてをまとめて返します。
    /// 一部だけ適用されることはありません。
    pub fn parse(raw: &RawListQuery, schema: &ResourceSchema) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();

        let page = match present(&raw.page).map(str::parse::<i64>) {
            None => Some(DEFAULT_PAGE),
            Some(Err(_)) => {
                errors.push("page must be an integer".to_string());
                None
            }
            Some(Ok(n)) if n < 1 => {
                errors.push("page must be greater than or equal to 1".to_string());
                None
            }
            Some(Ok(n)) => match u32::try_from(n) {
                Ok(n) => Some(n),
                Err(_) => {
                    errors.push(format!("page must be at most {}", u32::MAX));
                    None
                }
            },
        };

        let limit = match present(&raw.limit).map(str::parse::<i64>) {
            None => Some(DEFAULT_LIMIT),
            Some(Ok(n)) if (1..=MAX_LIMIT as i64).contains(&n) => Some(n as u32),
            Some(Ok(_)) => {
                errors.push(format!("limit must be between 1 and {}", MAX_LIMIT));
                None
            }
            Some(Err(_)) => {
                errors.push(format!(
                    "limit must be an integer between 1 and {}",
                    MAX_LIMIT
                ));
                None
            }
        };

        let order = match present(&raw.sort_order).map(str::to_ascii_lowercase).as_deref() {
            None => Some(SortOrder::Desc),
            Some("asc") => Some(SortOrder::Asc),
            Some("desc") => Some(SortOrder::Desc),
            Some(_) => {
                errors.push("sortOrder must be one of: asc, desc".to_string());
                None
            }
        };

        let sort_field = present(&raw.sort).unwrap_or(schema.default_sort);
        let sort_column = schema.sort_column(sort_field);
        if sort_column.is_none() {
            errors.push(format!(
                "sort must be one of: {}",
                schema.sortable_names()
            ));
        }

        let mut filters = Vec::new();

        if let Some(term) = present(&raw.search) {
            if schema.searchable.is_empty() {
                errors.push("search is not supported for this resource".to_string());
            } else {
                filters.push(Filter::search(schema.searchable, term));
            }
        }

        let start = parse_date("startDate", &raw.start_date, &mut errors);
        let end = parse_date("endDate", &raw.end_date, &mut errors);
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                errors.push("startDate must not be after endDate".to_string());
            }
        }
        if start.is_some() || end.is_some() {
            match schema.date_column {
                Some(column) => filters.push(Filter::date_range(column, start, end)),
                None => errors.push("date filtering is not supported for this resource".to_string()),
            }
        }

        if let Some(status) = present(&raw.status) {
            match schema.status {
                None => errors.push("status filtering is not supported for this resource".to_string()),
                Some(field) => {
                    let mut wanted = Vec::new();
                    for value in status.split(',').map(str::trim).filter(|v| !v.is_empty()) {
                        if field.allowed.contains(&value) {
                            wanted.push(Filter::eq(field.column, value));
                        } else {
                            errors.push(format!(
                                "status must be one of: {}",
                                field.allowed.join(", ")
                            ));
                            break;
                        }
                    }
                    if !wanted.is_empty() {
                        filters.push(Filter::any(wanted));
                    }
                }
            }
        }

        match (page, limit, order, sort_column) {
            (Some(page), Some(limit), Some(order), Some(sort_column)) if errors.is_empty() => {
                Ok(Self {
                    page,
                    limit,
                    sort_column,
                    order,
                    filter: Filter::and(filters),
                })
            }
            _ => Err(ValidationErrors(errors)),
        }
    }

    /// 追加の制限（可視範囲など）を AND で重ねる
    pub fn restrict(mut self, filter: Filter) -> Self {
        self.filter = Filter::and(vec![self.filter, filter]);
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(name: &str, value: &Option<String>, errors: &mut Vec<String>) -> Option<NaiveDate> {
    let raw = present(value)?;
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(format!("{name} must be a valid date in YYYY-MM-DD format"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::StatusField;

    const VACCINATIONS: ResourceSchema = ResourceSchema {
        sortable: &[("createdAt", "created_at"), ("date", "date")],
        default_sort: "createdAt",
        searchable: &["child_name", "vaccine_name"],
        date_column: Some("date"),
        status: Some(StatusField {
            column: "status",
            allowed: &["scheduled", "completed", "missed", "cancelled"],
        }),
    };

    fn raw() -> RawListQuery {
        RawListQuery::default()
    }

    fn errors_of(raw: RawListQuery) -> Vec<String> {
        ListQuery::parse(&raw, &VACCINATIONS).unwrap_err().0
    }

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let query = ListQuery::parse(&raw(), &VACCINATIONS).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 20);
        assert_eq!(query.sort_column, "created_at");
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.filter, Filter::All);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn valid_parameters_are_applied() {
        let query = ListQuery::parse(
            &RawListQuery {
                page: Some("3".into()),
                limit: Some("100".into()),
                sort: Some("date".into()),
                sort_order: Some("ASC".into()),
                ..raw()
            },
            &VACCINATIONS,
        )
        .unwrap();
        assert_eq!((query.page, query.limit), (3, 100));
        assert_eq!(query.sort_column, "date");
        assert_eq!(query.order, SortOrder::Asc);
        assert_eq!(query.offset(), 200);
    }

    #[test]
    fn limit_out_of_range_is_rejected() {
        for bad in ["0", "101", "-5"] {
            let errors = errors_of(RawListQuery {
                limit: Some(bad.into()),
                ..raw()
            });
            assert_eq!(errors, vec!["limit must be between 1 and 100".to_string()]);
        }
    }

    #[test]
    fn non_integer_limit_lists_the_constraint() {
        for bad in ["ten", "2.5", "1e2"] {
            let errors = errors_of(RawListQuery {
                limit: Some(bad.into()),
                ..raw()
            });
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("between 1 and 100"), "{errors:?}");
        }
    }

    #[test]
    fn page_must_be_a_positive_integer() {
        assert_eq!(
            errors_of(RawListQuery {
                page: Some("0".into()),
                ..raw()
            }),
            vec!["page must be greater than or equal to 1".to_string()]
        );
        assert_eq!(
            errors_of(RawListQuery {
                page: Some("first".into()),
                ..raw()
            }),
            vec!["page must be an integer".to_string()]
        );
    }

    #[test]
    fn every_problem_is_reported_together() {
        let errors = errors_of(RawListQuery {
            page: Some("x".into()),
            limit: Some("500".into()),
            sort: Some("password".into()),
            sort_order: Some("sideways".into()),
            start_date: Some("2024-13-01".into()),
            status: Some("lost".into()),
            ..raw()
        });
        assert_eq!(errors.len(), 6, "{errors:?}");
        assert!(errors.iter().any(|e| e.starts_with("sortOrder")));
        assert!(errors.iter().any(|e| e.starts_with("sort must be one of: createdAt, date")));
    }

    #[test]
    fn valid_fields_are_not_applied_when_another_fails() {
        let result = ListQuery::parse(
            &RawListQuery {
                page: Some("2".into()),
                sort_order: Some("upward".into()),
                ..raw()
            },
            &VACCINATIONS,
        );
        assert!(result.is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let query = ListQuery::parse(
            &RawListQuery {
                page: Some("".into()),
                search: Some("   ".into()),
                ..raw()
            },
            &VACCINATIONS,
        )
        .unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.filter, Filter::All);
    }

    #[test]
    fn filters_are_combined_with_and() {
        let query = ListQuery::parse(
            &RawListQuery {
                search: Some("bcg".into()),
                start_date: Some("2024-01-01".into()),
                end_date: Some("2024-01-31".into()),
                status: Some("completed,missed".into()),
                ..raw()
            },
            &VACCINATIONS,
        )
        .unwrap();

        let Filter::And(parts) = &query.filter else {
            panic!("expected a conjunction, got {:?}", query.filter);
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(parts[0], Filter::Search { .. }));
        assert!(matches!(parts[1], Filter::DateRange { column: "date", .. }));
        assert!(matches!(&parts[2], Filter::Any(statuses) if statuses.len() == 2));
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let errors = errors_of(RawListQuery {
            start_date: Some("2024-02-01".into()),
            end_date: Some("2024-01-01".into()),
            ..raw()
        });
        assert_eq!(errors, vec!["startDate must not be after endDate".to_string()]);
    }

    #[test]
    fn unsupported_filters_are_reported() {
        const PLAIN: ResourceSchema = ResourceSchema {
            sortable: &[("createdAt", "created_at")],
            default_sort: "createdAt",
            searchable: &[],
            date_column: None,
            status: None,
        };
        let errors = ListQuery::parse(
            &RawListQuery {
                search: Some("x".into()),
                end_date: Some("2024-01-01".into()),
                status: Some("active".into()),
                ..raw()
            },
            &PLAIN,
        )
        .unwrap_err()
        .0;
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn restrict_adds_a_conjunct() {
        let query = ListQuery::default().restrict(Filter::eq("region", "Centre"));
        assert_eq!(query.filter, Filter::eq("region", "Centre"));
    }

    #[test]
    fn validation_errors_become_bad_request() {
        let err: AppError = ValidationErrors(vec!["limit must be between 1 and 100".into()]).into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.details(), ["limit must be between 1 and 100".to_string()]);
    }
}
