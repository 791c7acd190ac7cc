//! Request handlers for the document engine.
//!
//! Handlers stay thin: writes go through the shared `DocumentService`,
//! reads go straight to the repositories in `fleetdocs_db`. Errors are
//! mapped via [`AppError`](crate::error::AppError).

pub mod document_types;
pub mod documents;
pub mod subjects;
