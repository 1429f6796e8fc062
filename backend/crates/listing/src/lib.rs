//! Listing - pagination, sorting and filtering for every list endpoint
//!
//! A list request goes through three steps:
//!
//! 1. [`RawListQuery`] is deserialised from the query string without any
//!    type coercion, so malformed values reach validation instead of being
//!    rejected by the extractor.
//! 2. [`ListQuery::parse`] validates it against the resource's
//!    [`ResourceSchema`] and either yields a fully validated query or the
//!    full list of problems. Nothing is applied partially.
//! 3. The resulting [`Filter`] (combined with the caller's visibility filter)
//!    is rendered into SQL by [`sql`] or evaluated in memory by
//!    [`Filter::matches`], and the page is wrapped in [`Paginated`].

pub mod filter;
pub mod page;
pub mod query;
pub mod schema;
pub mod sql;
pub mod visibility;

pub use filter::{FieldValue, Filter, Filterable};
pub use page::{PageInfo, Paginated, paginate_in_memory};
pub use query::{
    DEFAULT_LIMIT, DEFAULT_PAGE, ListQuery, MAX_LIMIT, RawListQuery, SortOrder, ValidationErrors,
};
pub use schema::{ResourceSchema, StatusField};
pub use visibility::{ScopeColumns, visibility_filter};
