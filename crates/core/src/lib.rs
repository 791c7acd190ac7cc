//! Document expiry engine.
//!
//! Pure domain logic for fleet documents: expiry classification, record
//! validation, state reconciliation, plus the repository, upload sink and
//! clock seams that infrastructure crates implement.

pub mod clock;
pub mod document;
pub mod error;
pub mod expiry;
pub mod reconcile;
pub mod repository;
pub mod service;
pub mod types;
pub mod upload;
