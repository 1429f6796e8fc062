//! Paginated envelope

use serde::Serialize;
use std::cmp::Ordering;

use crate::filter::Filterable;
use crate::query::{ListQuery, SortOrder};

/// ページ情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
}

impl PageInfo {
    pub fn new(page: u32, limit: u32, total_items: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            u32::try_from(total_items.div_ceil(limit as u64)).unwrap_or(u32::MAX)
        };
        let has_next_page = page < total_pages;
        let has_prev_page = page > 1;
        Self {
            current_page: page,
            total_pages,
            total_items,
            items_per_page: limit,
            has_next_page,
            has_prev_page,
            next_page: has_next_page.then(|| page + 1),
            prev_page: has_prev_page.then(|| page - 1),
        }
    }
}

/// 一覧レスポンス
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, query: &ListQuery, total_items: u64) -> Self {
        Self {
            data,
            pagination: PageInfo::new(query.page, query.limit, total_items),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// メモリ上で絞り込み・並び替え・切り出しを行う
///
/// 戻り値は (ページ内の要素, 絞り込み後の総件数)。
pub fn paginate_in_memory<T: Filterable + Clone>(items: &[T], query: &ListQuery) -> (Vec<T>, u64) {
    let mut matched: Vec<&T> = items.iter().filter(|item| query.filter.matches(*item)).collect();
    let total = matched.len() as u64;

    matched.sort_by(|a, b| {
        let ord = a
            .field(query.sort_column)
            .partial_cmp(&b.field(query.sort_column))
            .unwrap_or(Ordering::Equal);
        match query.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    let page = matched
        .into_iter()
        .skip(query.offset().max(0) as usize)
        .take(query.limit as usize)
        .cloned()
        .collect();
    (page, total)
}
