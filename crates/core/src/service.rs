//! Document lifecycle orchestration.
//!
//! [`DocumentService`] wires the pure pieces (validation, classification,
//! reconciliation) to the collaborators (repository, upload sink, clock).
//!
//! Ordering for writes:
//!
//! 1. Validate the draft, including storage lookups. Nothing is written yet.
//! 2. Store the attachment, if any.
//! 3. Classify against the injected clock and persist.
//! 4. If persisting fails, remove the attachment stored in step 2.
//!
//! Removal failures are logged and never replace the original error.

use std::sync::Arc;

use crate::clock::Clock;
use crate::document::{
    check_document_type, check_subject, validate_draft_fields, DocumentDraft, DocumentPatch,
    DocumentRecord, ValidatedDocument,
};
use crate::error::{CoreError, CoreResult};
use crate::reconcile::{reconcile, ReconcileReport};
use crate::repository::DocumentRepository;
use crate::types::DbId;
use crate::upload::{StoredFileHandle, UploadRequest, UploadSink, MAX_UPLOAD_BYTES};

/// Registration, edit, deletion and reconciliation of documents.
pub struct DocumentService<R, S> {
    repo: R,
    sink: S,
    clock: Arc<dyn Clock>,
    max_upload_bytes: u64,
}

impl<R, S> DocumentService<R, S>
where
    R: DocumentRepository,
    S: UploadSink,
{
    pub fn new(repo: R, sink: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            sink,
            clock,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Run every check on `draft`, without side effects.
    ///
    /// `exclude_id` is the document being edited, so its own number does not
    /// count as a duplicate.
    pub async fn validate(
        &self,
        draft: DocumentDraft,
        exclude_id: Option<DbId>,
    ) -> CoreResult<ValidatedDocument> {
        let draft = validate_draft_fields(draft)?;

        let subject = self.repo.find_subject(draft.subject).await?;
        check_subject(draft.subject, subject.as_ref())?;

        let doc_type = self.repo.find_document_type(draft.document_type_id).await?;
        let alert_window_days = check_document_type(
            draft.document_type_id,
            draft.subject,
            doc_type.as_ref(),
            draft.alert_window_days,
        )?;

        if self
            .repo
            .document_number_taken(draft.subject, &draft.document_number, exclude_id)
            .await?
        {
            return Err(CoreError::DuplicateDocumentNumber {
                subject: draft.subject,
                document_number: draft.document_number,
            });
        }

        Ok(ValidatedDocument {
            draft,
            alert_window_days,
        })
    }

    /// Register a new document with an optional attachment.
    pub async fn register(
        &self,
        draft: DocumentDraft,
        upload: Option<UploadRequest>,
    ) -> CoreResult<DocumentRecord> {
        let validated = self.validate(draft, None).await?;

        let attachment = match upload {
            Some(request) => Some(self.sink.store(request, self.max_upload_bytes).await?),
            None => None,
        };

        let state = validated.classify(self.clock.today());
        let fields = validated.into_fields(state, attachment.clone());

        match self.repo.insert(&fields).await {
            Ok(record) => {
                tracing::info!(
                    document_id = record.id,
                    subject = %record.subject,
                    state = %state,
                    "Document registered"
                );
                Ok(record)
            }
            Err(err) => {
                if let Some(stored) = &attachment {
                    self.discard_upload(stored).await;
                }
                Err(err)
            }
        }
    }

    /// Apply a partial edit, optionally replacing the attachment.
    ///
    /// State is recomputed from the merged fields. The previous attachment is
    /// removed only after the update succeeds.
    pub async fn edit(
        &self,
        id: DbId,
        patch: DocumentPatch,
        upload: Option<UploadRequest>,
    ) -> CoreResult<DocumentRecord> {
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Document",
                id,
            })?;

        let draft = DocumentDraft::from_record(&existing).merged(patch);
        let validated = self.validate(draft, Some(id)).await?;

        let replacement = match upload {
            Some(request) => Some(self.sink.store(request, self.max_upload_bytes).await?),
            None => None,
        };
        let attachment = replacement
            .clone()
            .or_else(|| existing.attachment.clone());

        let state = validated.classify(self.clock.today());
        let fields = validated.into_fields(state, attachment);

        let result = match self.repo.update(id, &fields).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(CoreError::NotFound {
                entity: "Document",
                id,
            }),
            Err(err) => Err(err),
        };

        match (&result, &replacement) {
            (Ok(_), Some(_)) => {
                if let Some(old) = &existing.attachment {
                    self.discard_upload(old).await;
                }
            }
            (Err(_), Some(new)) => self.discard_upload(new).await,
            _ => {}
        }

        if let Ok(record) = &result {
            tracing::info!(document_id = record.id, state = %state, "Document updated");
        }
        result
    }

    /// Hard-delete a document and then remove its attachment.
    pub async fn delete(&self, id: DbId) -> CoreResult<DocumentRecord> {
        let removed = self
            .repo
            .delete(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Document",
                id,
            })?;

        if let Some(stored) = &removed.attachment {
            self.discard_upload(stored).await;
        }
        tracing::info!(document_id = id, "Document deleted");
        Ok(removed)
    }

    /// Reconcile every active document against today and persist the changes.
    pub async fn reconcile_now(&self) -> CoreResult<ReconcileReport> {
        let today = self.clock.today();
        let documents = self.repo.find_all_active().await?;
        let changeset = reconcile(&documents, today);

        let applied = if changeset.is_empty() {
            0
        } else {
            self.repo.apply_changeset(&changeset).await?
        };

        tracing::info!(
            %today,
            examined = documents.len(),
            changed = changeset.len(),
            applied,
            "Document states reconciled"
        );

        Ok(ReconcileReport {
            examined: documents.len(),
            changed: changeset.len(),
            applied,
            transitions: changeset.to_update,
        })
    }

    /// Best-effort removal of a stored upload.
    async fn discard_upload(&self, stored: &StoredFileHandle) {
        if let Err(e) = self.sink.remove(&stored.stored_path).await {
            tracing::warn!(
                stored_path = %stored.stored_path,
                error = %e,
                "Failed to remove stored upload"
            );
        }
    }
}
