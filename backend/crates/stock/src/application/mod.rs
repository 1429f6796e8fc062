//! Application Layer
//!
//! Use cases for stock transfers.

pub mod create_transfer;
pub mod list_transfers;
pub mod resolve_transfer;

#[cfg(test)]
pub(crate) mod test_support;

pub use create_transfer::{CreateTransferInput, CreateTransferUseCase};
pub use list_transfers::{ListTransfersUseCase, TRANSFER_SCHEMA};
pub use resolve_transfer::ResolveTransferUseCase;
