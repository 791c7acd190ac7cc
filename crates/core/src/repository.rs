//! The persistence seam consumed by the engine.
//!
//! Implementations translate their own failures into [`CoreError`]: generic
//! failures become [`CoreError::Storage`], unique-constraint violations on
//! `(subject, document_number)` become [`CoreError::DuplicateDocumentNumber`],
//! and references that vanish inside a write transaction become
//! [`CoreError::ReferenceNotFound`].

use async_trait::async_trait;

use crate::document::{DocumentFields, DocumentRecord, DocumentTypeInfo, Subject, SubjectRef};
use crate::error::CoreResult;
use crate::reconcile::Changeset;
use crate::types::DbId;

/// Infrastructure failure reported by a repository.
#[derive(Debug, thiserror::Error)]
#[error("Storage error: {message}")]
pub struct StorageError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Document persistence as the engine needs it.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<DocumentRecord>>;

    async fn find_by_subject(&self, subject: SubjectRef) -> CoreResult<Vec<DocumentRecord>>;

    /// Every document whose subject is active.
    async fn find_all_active(&self) -> CoreResult<Vec<DocumentRecord>>;

    async fn insert(&self, fields: &DocumentFields) -> CoreResult<DocumentRecord>;

    /// Replace the editable fields of a document. `None` if it does not exist.
    async fn update(&self, id: DbId, fields: &DocumentFields) -> CoreResult<Option<DocumentRecord>>;

    /// Hard delete, returning the removed row. `None` if it did not exist.
    async fn delete(&self, id: DbId) -> CoreResult<Option<DocumentRecord>>;

    /// Persist state transitions. Returns the number of rows updated.
    ///
    /// A transition is skipped when the stored state no longer equals its
    /// `old_state` (the row was edited concurrently).
    async fn apply_changeset(&self, changeset: &Changeset) -> CoreResult<u64>;

    async fn find_subject(&self, subject: SubjectRef) -> CoreResult<Option<Subject>>;

    async fn find_document_type(&self, id: DbId) -> CoreResult<Option<DocumentTypeInfo>>;

    /// Whether `document_number` is already used by another document of `subject`.
    async fn document_number_taken(
        &self,
        subject: SubjectRef,
        document_number: &str,
        exclude_id: Option<DbId>,
    ) -> CoreResult<bool>;
}
