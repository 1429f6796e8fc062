//! Shared Kernel - vocabulary shared by every VacXCare crate
//!
//! - Unified error type rendered as RFC 7807 problem details
//! - Typed entity identifiers
//! - Administrative tiers, the authenticated principal and its access scope
//!
//! Only concepts whose meaning is identical in every bounded context live here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
pub mod scope;
