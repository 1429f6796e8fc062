//! Stock Router

use std::sync::Arc;

use auth::HealthCenterDirectory;
use axum::{
    Router,
    routing::{get, post},
};
use platform::events::EventBus;

use crate::domain::repository::TransferRepository;
use crate::presentation::handlers::{self, StockAppState};

/// Stock routes, nested under `/api/stocks`
///
/// Like the care routes these read `Principal` and `AccessScope` from the
/// request extensions.
pub fn stock_router<T, D>(transfers: T, directory: D, events: EventBus) -> Router
where
    T: TransferRepository + Clone + Send + Sync + 'static,
    D: HealthCenterDirectory + Clone + Send + Sync + 'static,
{
    let state = StockAppState {
        transfers: Arc::new(transfers),
        directory: Arc::new(directory),
        events,
    };

    Router::new()
        .route(
            "/transfers",
            get(handlers::list_transfers::<T, D>).post(handlers::create_transfer::<T, D>),
        )
        .route(
            "/transfers/pending-count",
            get(handlers::pending_count::<T, D>),
        )
        .route(
            "/transfers/{id}",
            get(handlers::get_transfer::<T, D>).patch(handlers::update_transfer::<T, D>),
        )
        .route(
            "/transfers/{id}/accept",
            post(handlers::accept_transfer::<T, D>),
        )
        .route(
            "/transfers/{id}/reject",
            post(handlers::reject_transfer::<T, D>),
        )
        .route(
            "/transfers/{id}/cancel",
            post(handlers::cancel_transfer::<T, D>),
        )
        .with_state(state)
}
