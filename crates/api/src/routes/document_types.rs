//! Route definitions for the `/document-types` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::document_types;
use crate::state::AppState;

/// Routes mounted at `/document-types`.
///
/// ```text
/// GET    /                  -> list
/// POST   /                  -> create
/// GET    /{id}              -> get_by_id
/// PUT    /{id}              -> update
/// DELETE /{id}              -> deactivate
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(document_types::list).post(document_types::create))
        .route(
            "/{id}",
            get(document_types::get_by_id)
                .put(document_types::update)
                .delete(document_types::deactivate),
        )
}
