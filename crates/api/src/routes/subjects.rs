//! Route definitions for subject lookups.

use axum::routing::get;
use axum::Router;

use crate::handlers::subjects;
use crate::state::AppState;

/// Routes mounted at `/vehicles`.
///
/// ```text
/// GET    /by-plate/{plate}  -> vehicle_by_plate
/// GET    /{id}/documents    -> vehicle_documents
/// ```
pub fn vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/by-plate/{plate}", get(subjects::vehicle_by_plate))
        .route("/{id}/documents", get(subjects::vehicle_documents))
}

/// Routes mounted at `/persons`.
///
/// ```text
/// GET    /by-run/{run}      -> person_by_run
/// GET    /{id}/documents    -> person_documents
/// ```
pub fn person_router() -> Router<AppState> {
    Router::new()
        .route("/by-run/{run}", get(subjects::person_by_run))
        .route("/{id}/documents", get(subjects::person_documents))
}
