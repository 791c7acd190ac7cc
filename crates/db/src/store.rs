//! Postgres implementation of the engine's [`DocumentRepository`].

use async_trait::async_trait;
use fleetdocs_core::document::{
    DocumentFields, DocumentRecord, DocumentTypeInfo, Subject, SubjectKind, SubjectRef,
};
use fleetdocs_core::error::{CoreError, CoreResult, ReferenceKind};
use fleetdocs_core::reconcile::Changeset;
use fleetdocs_core::repository::{DocumentRepository, StorageError};
use fleetdocs_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::document::{CreateDocument, Document};
use crate::repositories::{DocumentRepo, DocumentTypeRepo, PersonRepo, VehicleRepo};

/// PostgreSQL error code for unique violations.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL error code for foreign key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// [`DocumentRepository`] backed by a connection pool.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Load a subject inside the transaction, holding a share lock.
    async fn lock_subject(
        conn: &mut PgConnection,
        subject: SubjectRef,
    ) -> Result<Option<Subject>, sqlx::Error> {
        Ok(match subject.kind {
            SubjectKind::Vehicle => VehicleRepo::lock_for_share(conn, subject.id)
                .await?
                .map(|v| v.to_subject()),
            SubjectKind::Person => PersonRepo::lock_for_share(conn, subject.id)
                .await?
                .map(|p| p.to_subject()),
        })
    }

    /// Re-check both references under lock so they cannot vanish before commit.
    async fn lock_references(conn: &mut PgConnection, fields: &DocumentFields) -> CoreResult<()> {
        let subject = Self::lock_subject(conn, fields.subject)
            .await
            .map_err(|e| storage_error("lock subject", e))?;
        if !subject.is_some_and(|s| s.is_active) {
            return Err(CoreError::ReferenceNotFound {
                kind: ReferenceKind::Subject,
                id: fields.subject.id,
            });
        }

        let doc_type = DocumentTypeRepo::lock_for_share(conn, fields.document_type_id)
            .await
            .map_err(|e| storage_error("lock document type", e))?;
        if !doc_type.is_some_and(|t| t.is_active) {
            return Err(CoreError::ReferenceNotFound {
                kind: ReferenceKind::DocumentType,
                id: fields.document_type_id,
            });
        }
        Ok(())
    }
}

/// Wrap an sqlx error as an engine storage failure.
fn storage_error(context: &str, err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, context, "Document storage failure");
    StorageError::with_source(format!("failed to {context}"), err).into()
}

/// Translate constraint violations raised by a document write.
///
/// - Unique violation on `uq_documents_*` becomes `DuplicateDocumentNumber`.
/// - Foreign key violation becomes `ReferenceNotFound`.
/// - Anything else is a storage failure.
fn write_error(context: &str, err: sqlx::Error, fields: &DocumentFields) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or("");
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) if constraint.starts_with("uq_documents_") => {
                return CoreError::DuplicateDocumentNumber {
                    subject: fields.subject,
                    document_number: fields.document_number.clone(),
                };
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return if constraint.contains("document_type") {
                    CoreError::ReferenceNotFound {
                        kind: ReferenceKind::DocumentType,
                        id: fields.document_type_id,
                    }
                } else {
                    CoreError::ReferenceNotFound {
                        kind: ReferenceKind::Subject,
                        id: fields.subject.id,
                    }
                };
            }
            _ => {}
        }
    }
    storage_error(context, err)
}

fn to_records(rows: Vec<Document>) -> CoreResult<Vec<DocumentRecord>> {
    rows.iter().map(Document::to_record).collect()
}

#[async_trait]
impl DocumentRepository for PgDocumentStore {
    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<DocumentRecord>> {
        DocumentRepo::find_by_id(&self.pool, id)
            .await
            .map_err(|e| storage_error("load document", e))?
            .as_ref()
            .map(Document::to_record)
            .transpose()
    }

    async fn find_by_subject(&self, subject: SubjectRef) -> CoreResult<Vec<DocumentRecord>> {
        let rows = DocumentRepo::list_by_subject(&self.pool, subject)
            .await
            .map_err(|e| storage_error("list subject documents", e))?;
        to_records(rows)
    }

    async fn find_all_active(&self) -> CoreResult<Vec<DocumentRecord>> {
        let rows = DocumentRepo::list_all_active(&self.pool)
            .await
            .map_err(|e| storage_error("list active documents", e))?;
        to_records(rows)
    }

    async fn insert(&self, fields: &DocumentFields) -> CoreResult<DocumentRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("begin transaction", e))?;

        Self::lock_references(&mut *tx, fields).await?;

        let row = DocumentRepo::create(&mut *tx, &CreateDocument::from(fields))
            .await
            .map_err(|e| write_error("insert document", e, fields))?;

        tx.commit()
            .await
            .map_err(|e| storage_error("commit document insert", e))?;
        row.to_record()
    }

    async fn update(&self, id: DbId, fields: &DocumentFields) -> CoreResult<Option<DocumentRecord>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("begin transaction", e))?;

        Self::lock_references(&mut *tx, fields).await?;

        let row = DocumentRepo::update(&mut *tx, id, &CreateDocument::from(fields))
            .await
            .map_err(|e| write_error("update document", e, fields))?;

        tx.commit()
            .await
            .map_err(|e| storage_error("commit document update", e))?;
        row.as_ref().map(Document::to_record).transpose()
    }

    async fn delete(&self, id: DbId) -> CoreResult<Option<DocumentRecord>> {
        DocumentRepo::hard_delete(&self.pool, id)
            .await
            .map_err(|e| storage_error("delete document", e))?
            .as_ref()
            .map(Document::to_record)
            .transpose()
    }

    async fn apply_changeset(&self, changeset: &Changeset) -> CoreResult<u64> {
        if changeset.is_empty() {
            return Ok(0);
        }
        let applied = DocumentRepo::apply_transitions(&self.pool, &changeset.to_update)
            .await
            .map_err(|e| storage_error("apply state changeset", e))?;
        if applied < changeset.len() as u64 {
            tracing::warn!(
                expected = changeset.len(),
                applied,
                "Some documents changed concurrently and were left for the next pass"
            );
        }
        Ok(applied)
    }

    async fn find_subject(&self, subject: SubjectRef) -> CoreResult<Option<Subject>> {
        let found = match subject.kind {
            SubjectKind::Vehicle => VehicleRepo::find_by_id(&self.pool, subject.id)
                .await
                .map(|v| v.map(|v| v.to_subject())),
            SubjectKind::Person => PersonRepo::find_by_id(&self.pool, subject.id)
                .await
                .map(|p| p.map(|p| p.to_subject())),
        };
        found.map_err(|e| storage_error("load subject", e))
    }

    async fn find_document_type(&self, id: DbId) -> CoreResult<Option<DocumentTypeInfo>> {
        DocumentTypeRepo::find_by_id(&self.pool, id)
            .await
            .map_err(|e| storage_error("load document type", e))?
            .as_ref()
            .map(|t| t.to_info())
            .transpose()
    }

    async fn document_number_taken(
        &self,
        subject: SubjectRef,
        document_number: &str,
        exclude_id: Option<DbId>,
    ) -> CoreResult<bool> {
        DocumentRepo::number_taken(&self.pool, subject, document_number, exclude_id)
            .await
            .map_err(|e| storage_error("check document number", e))
    }
}
