//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! `&PgPool` as the first argument. Writes that must share a transaction
//! take `&mut PgConnection` instead (pass `&mut *tx`).

pub mod document_repo;
pub mod document_type_repo;
pub mod person_repo;
pub mod vehicle_repo;

pub use document_repo::DocumentRepo;
pub use document_type_repo::DocumentTypeRepo;
pub use person_repo::PersonRepo;
pub use vehicle_repo::VehicleRepo;
