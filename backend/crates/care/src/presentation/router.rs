//! Care Router

use axum::{Router, routing::get};
use platform::events::EventBus;
use std::sync::Arc;

use crate::domain::repository::{CareStore, PendingTransferCounter};
use crate::presentation::handlers::{self, CareAppState};

/// Care routes (health centers, vaccines, children, vaccinations, dashboard)
///
/// Expects `Principal` and `AccessScope` in the request extensions, so the
/// caller must layer the session and scope middleware on top.
pub fn care_router<R, T>(repo: R, transfers: T, events: EventBus) -> Router
where
    R: CareStore,
    T: PendingTransferCounter + Clone + Send + Sync + 'static,
{
    let state = CareAppState {
        repo: Arc::new(repo),
        transfers: Arc::new(transfers),
        events,
    };

    Router::new()
        .route(
            "/health-centers",
            get(handlers::list_health_centers::<R, T>)
                .post(handlers::create_health_center::<R, T>),
        )
        .route(
            "/health-centers/{id}",
            get(handlers::get_health_center::<R, T>),
        )
        .route("/vaccines", get(handlers::list_vaccines::<R, T>))
        .route(
            "/children",
            get(handlers::list_children::<R, T>).post(handlers::create_child::<R, T>),
        )
        .route("/children/{id}", get(handlers::get_child::<R, T>))
        .route(
            "/vaccinations",
            get(handlers::list_vaccinations::<R, T>).post(handlers::create_vaccination::<R, T>),
        )
        .route(
            "/vaccinations/{id}",
            get(handlers::get_vaccination::<R, T>).patch(handlers::update_vaccination::<R, T>),
        )
        .route("/dashboard", get(handlers::dashboard::<R, T>))
        .route(
            "/dashboard/{level}",
            get(handlers::dashboard_for_level::<R, T>),
        )
        .with_state(state)
}
