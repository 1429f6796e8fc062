//! SQL rendering
//!
//! Filters are appended to a [`QueryBuilder`]. Column names come from static
//! schemas; every user-supplied value is bound as a parameter.

use chrono::Days;
use sqlx::{Postgres, QueryBuilder};

use crate::filter::Filter;
use crate::query::ListQuery;

/// `WHERE` 句を追加（無制限なら何もしない）
pub fn push_where(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    if filter.is_all() {
        return;
    }
    qb.push(" WHERE ");
    push_filter(qb, filter);
}

/// 条件式を追加
pub fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {
            qb.push("TRUE");
        }
        Filter::Eq { column, value } => {
            qb.push(*column).push(" = ").push_bind(value.clone());
        }
        Filter::Search { columns, term } => {
            let pattern = format!("%{}%", escape_like(term));
            qb.push("(");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*column).push(" ILIKE ").push_bind(pattern.clone());
            }
            qb.push(")");
        }
        Filter::DateRange { column, start, end } => {
            qb.push("(");
            let mut first = true;
            if let Some(start) = start {
                qb.push(*column).push(" >= ").push_bind(*start);
                first = false;
            }
            if let Some(end) = end {
                if !first {
                    qb.push(" AND ");
                }
                // 終了日はその日の終わりまで含める
                let next_day = end.checked_add_days(Days::new(1)).unwrap_or(*end);
                qb.push(*column).push(" < ").push_bind(next_day);
            }
            qb.push(")");
        }
        Filter::And(parts) => push_joined(qb, parts, " AND ", "TRUE"),
        Filter::Any(parts) => push_joined(qb, parts, " OR ", "FALSE"),
    }
}

fn push_joined(qb: &mut QueryBuilder<'_, Postgres>, parts: &[Filter], sep: &str, empty: &str) {
    if parts.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            qb.push(sep);
        }
        push_filter(qb, part);
    }
    qb.push(")");
}

/// `ORDER BY ... LIMIT ... OFFSET ...` を追加
///
/// 同順位の行が頁をまたいで揺れないよう `id` を第二キーにします。
pub fn push_order_and_page(qb: &mut QueryBuilder<'_, Postgres>, query: &ListQuery) {
    let dir = query.order.as_sql();
    qb.push(" ORDER BY ")
        .push(query.sort_column)
        .push(" ")
        .push(dir)
        .push(", id ")
        .push(dir)
        .push(" LIMIT ")
        .push_bind(query.limit as i64)
        .push(" OFFSET ")
        .push_bind(query.offset());
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
