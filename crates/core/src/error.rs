use std::fmt;

use crate::document::SubjectRef;
use crate::repository::StorageError;
use crate::types::DbId;
use crate::upload::UploadError;

/// Which kind of reference a [`CoreError::ReferenceNotFound`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Subject,
    DocumentType,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subject => f.write_str("Subject"),
            Self::DocumentType => f.write_str("DocumentType"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed on {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Document number '{document_number}' already registered for {subject}")]
    DuplicateDocumentNumber {
        subject: SubjectRef,
        document_number: String,
    },

    #[error("Referenced {kind} with id {id} does not exist or is inactive")]
    ReferenceNotFound { kind: ReferenceKind, id: DbId },

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CoreError {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used across the engine.
pub type CoreResult<T> = Result<T, CoreError>;
