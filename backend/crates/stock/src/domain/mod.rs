//! Domain Layer
//!
//! The stock transfer state machine and its access rules.

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;

pub use entities::{Endpoint, Resolution, StockTransfer};
pub use repository::{LocalTransferRepository, TransferRepository};
pub use value_objects::{TransferAction, TransferStatus};
