//! Repository for the `document_types` table.

use fleetdocs_core::document::SubjectKind;
use fleetdocs_core::expiry::DEFAULT_ALERT_WINDOW_DAYS;
use fleetdocs_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::document_type::{CreateDocumentType, DocumentType, UpdateDocumentType};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, client_id, subject_kind, name, description, \
    default_alert_window_days, obligatory, is_active, created_at, updated_at";

/// Provides CRUD operations for document types.
pub struct DocumentTypeRepo;

impl DocumentTypeRepo {
    /// Insert a new document type for `client_id`.
    ///
    /// Window defaults to 30 days, `obligatory` to `false`.
    pub async fn create(
        pool: &PgPool,
        client_id: DbId,
        input: &CreateDocumentType,
    ) -> Result<DocumentType, sqlx::Error> {
        let query = format!(
            "INSERT INTO document_types
                (client_id, subject_kind, name, description, default_alert_window_days, obligatory)
             VALUES ($1, $2, $3, $4, COALESCE($5, $6), COALESCE($7, false))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocumentType>(&query)
            .bind(client_id)
            .bind(input.subject_kind.as_str())
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(input.default_alert_window_days)
            .bind(DEFAULT_ALERT_WINDOW_DAYS)
            .bind(input.obligatory)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DocumentType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM document_types WHERE id = $1");
        sqlx::query_as::<_, DocumentType>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a client's document types by name, optionally for one subject kind.
    pub async fn list(
        pool: &PgPool,
        client_id: DbId,
        subject_kind: Option<SubjectKind>,
        include_inactive: bool,
    ) -> Result<Vec<DocumentType>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM document_types
             WHERE client_id = $1
               AND ($2::text IS NULL OR subject_kind = $2)
               AND ($3 OR is_active)
             ORDER BY subject_kind, name"
        );
        sqlx::query_as::<_, DocumentType>(&query)
            .bind(client_id)
            .bind(subject_kind.map(|k| k.as_str()))
            .bind(include_inactive)
            .fetch_all(pool)
            .await
    }

    /// Update a document type. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDocumentType,
    ) -> Result<Option<DocumentType>, sqlx::Error> {
        let query = format!(
            "UPDATE document_types SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                default_alert_window_days = COALESCE($4, default_alert_window_days),
                obligatory = COALESCE($5, obligatory),
                is_active = COALESCE($6, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocumentType>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(input.default_alert_window_days)
            .bind(input.obligatory)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Mark a document type inactive. Returns `true` if an active row was changed.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE document_types SET is_active = false WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Read a document type and hold a share lock on it until the transaction ends.
    pub async fn lock_for_share(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<DocumentType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM document_types WHERE id = $1 FOR SHARE");
        sqlx::query_as::<_, DocumentType>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }
}
