//! Route definitions for the `/documents` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::documents;
use crate::state::AppState;

/// Multipart framing and text fields on top of the largest accepted file.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Routes mounted at `/documents`.
///
/// The body limit sits above `upload_max_bytes` so oversized files reach the
/// upload policy and get a typed 413.
///
/// ```text
/// GET    /                  -> list
/// POST   /                  -> register (multipart)
/// GET    /stats             -> stats
/// GET    /upcoming          -> upcoming
/// GET    /recent            -> recent
/// POST   /reconcile         -> reconcile
/// GET    /{id}              -> get_by_id
/// PUT    /{id}              -> update (multipart)
/// DELETE /{id}              -> delete
/// GET    /{id}/download     -> download
/// ```
pub fn router(upload_max_bytes: u64) -> Router<AppState> {
    let body_limit = usize::try_from(upload_max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(documents::list).post(documents::register))
        .route("/stats", get(documents::stats))
        .route("/upcoming", get(documents::upcoming))
        .route("/recent", get(documents::recent))
        .route("/reconcile", post(documents::reconcile))
        .route(
            "/{id}",
            get(documents::get_by_id)
                .put(documents::update)
                .delete(documents::delete),
        )
        .route("/{id}/download", get(documents::download))
        .layer(DefaultBodyLimit::max(body_limit))
}
