//! Stock Backend Module
//!
//! Vaccine stock transfers between administrative tiers. A transfer always
//! goes one tier down (national → regional → district → agent) and moves
//! through a small state machine:
//!
//! ```text
//! pending ─┬─> accepted   (receiving side)
//!          ├─> rejected   (receiving side, optional reason)
//!          └─> cancelled  (sending side)
//! ```
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, state machine, access rules, repository trait
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL implementation
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Consistency
//! - Leaving `pending` is a single conditional update, so concurrent accept
//!   and reject calls cannot both succeed; the loser gets 409
//! - A transfer is visible when either endpoint is inside the caller's scope

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::{
    CreateTransferUseCase, ListTransfersUseCase, ResolveTransferUseCase, TRANSFER_SCHEMA,
};
pub use domain::{StockTransfer, TransferAction, TransferStatus};
pub use error::{StockError, StockResult};
pub use infra::postgres::PgStockRepository;
pub use presentation::router::stock_router;

#[cfg(test)]
mod tests;
