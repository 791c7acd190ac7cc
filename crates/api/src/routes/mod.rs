pub mod document_types;
pub mod documents;
pub mod health;
pub mod subjects;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /documents                         list, register (multipart)
/// /documents/stats                   counts per state
/// /documents/upcoming                expiring within ?days=
/// /documents/recent                  latest registrations
/// /documents/reconcile               run a reconciliation pass (POST)
/// /documents/{id}                    get, edit (multipart), delete
/// /documents/{id}/download           attachment
///
/// /document-types                    list, create
/// /document-types/{id}               get, update, deactivate
///
/// /vehicles/by-plate/{plate}         vehicle and its documents
/// /vehicles/{id}/documents           documents of a vehicle
///
/// /persons/by-run/{run}              person and their documents
/// /persons/{id}/documents            documents of a person
/// ```
pub fn api_routes(upload_max_bytes: u64) -> Router<AppState> {
    Router::new()
        .nest("/documents", documents::router(upload_max_bytes))
        .nest("/document-types", document_types::router())
        .nest("/vehicles", subjects::vehicle_router())
        .nest("/persons", subjects::person_router())
}
