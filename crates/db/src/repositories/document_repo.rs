//! Repository for the `documents` table.
//!
//! Every read joins the document type (for the effective alert window and
//! name) and the owning subject (for its label and active flag). Writes use a
//! data-modifying CTE so they return the same joined shape.

use fleetdocs_core::document::{SubjectKind, SubjectRef};
use fleetdocs_core::reconcile::StateTransition;
use fleetdocs_core::types::{CalendarDate, DbId};
use sqlx::{PgConnection, PgPool};

use crate::models::document::{CreateDocument, Document, DocumentFilter, DocumentStats};

/// Column list shared across queries, qualified against the `d` alias.
const COLUMNS: &str = "d.id, d.vehicle_id, d.person_id, d.document_type_id, d.document_number, \
    d.issue_date, d.expiry_date, d.alert_window_days, \
    COALESCE(d.alert_window_days, dt.default_alert_window_days) AS effective_alert_window_days, \
    d.state, d.file_stored_path, d.file_original_name, d.file_mime_type, d.file_size_bytes, \
    d.notes, d.created_at, d.updated_at, \
    dt.name AS document_type_name, \
    COALESCE(v.plate, p.first_names || ' ' || p.last_names) AS subject_label";

/// Joins applied after `FROM documents d` (or a CTE named `d`).
const JOINS: &str = "JOIN document_types dt ON dt.id = d.document_type_id \
    LEFT JOIN vehicles v ON v.id = d.vehicle_id \
    LEFT JOIN persons p ON p.id = d.person_id";

/// Severity-first ordering: vencido, por_vencer, vigente, unclassified.
const SEVERITY_ORDER: &str = "CASE d.state \
        WHEN 'vencido' THEN 1 WHEN 'por_vencer' THEN 2 WHEN 'vigente' THEN 3 ELSE 4 END, \
    d.expiry_date ASC, d.created_at DESC, d.id DESC";

/// Only documents whose subject is active.
const ACTIVE_SUBJECT: &str = "COALESCE(v.is_active, p.is_active, false)";

/// Foreign-key column holding a subject of the given kind.
fn subject_column(kind: SubjectKind) -> &'static str {
    match kind {
        SubjectKind::Vehicle => "vehicle_id",
        SubjectKind::Person => "person_id",
    }
}

/// Provides CRUD, listing and state-maintenance operations for documents.
pub struct DocumentRepo;

impl DocumentRepo {
    // ── Reads ────────────────────────────────────────────────────────

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents d {JOINS} WHERE d.id = $1");
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List documents of active subjects, most severe first.
    ///
    /// Restricted to the same population reconciliation maintains, so the
    /// state filter never matches a cached state nothing keeps current.
    pub async fn list(pool: &PgPool, filter: &DocumentFilter) -> Result<Vec<Document>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents d {JOINS}
             WHERE {ACTIVE_SUBJECT}
               AND ($1::text IS NULL
                    OR ($1 = 'vehicle' AND d.vehicle_id IS NOT NULL)
                    OR ($1 = 'person' AND d.person_id IS NOT NULL))
               AND ($2::text IS NULL OR d.state = $2)
             ORDER BY {SEVERITY_ORDER}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(filter.subject_kind.map(|k| k.as_str()))
            .bind(filter.state.map(|s| s.as_str()))
            .fetch_all(pool)
            .await
    }

    /// All documents of one subject, most severe first.
    pub async fn list_by_subject(
        pool: &PgPool,
        subject: SubjectRef,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let column = subject_column(subject.kind);
        let query = format!(
            "SELECT {COLUMNS} FROM documents d {JOINS}
             WHERE d.{column} = $1
             ORDER BY {SEVERITY_ORDER}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(subject.id)
            .fetch_all(pool)
            .await
    }

    /// Every document whose subject is active. Input to reconciliation.
    pub async fn list_all_active(pool: &PgPool) -> Result<Vec<Document>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents d {JOINS}
             WHERE {ACTIVE_SUBJECT}
             ORDER BY d.id"
        );
        sqlx::query_as::<_, Document>(&query).fetch_all(pool).await
    }

    /// Documents expiring after `today` and on or before `until`, soonest first.
    pub async fn list_upcoming(
        pool: &PgPool,
        today: CalendarDate,
        until: CalendarDate,
        limit: i64,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents d {JOINS}
             WHERE d.expiry_date > $1 AND d.expiry_date <= $2 AND {ACTIVE_SUBJECT}
             ORDER BY d.expiry_date ASC, d.id ASC
             LIMIT $3"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(today)
            .bind(until)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Most recently registered documents.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Document>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents d {JOINS}
             ORDER BY d.created_at DESC, d.id DESC
             LIMIT $1"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Counts per cached state over documents of active subjects, optionally
    /// restricted to one subject kind.
    pub async fn stats(
        pool: &PgPool,
        subject_kind: Option<SubjectKind>,
    ) -> Result<DocumentStats, sqlx::Error> {
        let query = format!(
            "SELECT \
                COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE d.state = 'vigente') AS vigente, \
                COUNT(*) FILTER (WHERE d.state = 'por_vencer') AS por_vencer, \
                COUNT(*) FILTER (WHERE d.state = 'vencido') AS vencido \
             FROM documents d {JOINS} \
             WHERE {ACTIVE_SUBJECT} \
               AND ($1::text IS NULL \
                    OR ($1 = 'vehicle' AND d.vehicle_id IS NOT NULL) \
                    OR ($1 = 'person' AND d.person_id IS NOT NULL))"
        );
        sqlx::query_as::<_, DocumentStats>(&query)
            .bind(subject_kind.map(|k| k.as_str()))
            .fetch_one(pool)
            .await
    }

    /// Whether another document of `subject` already uses `document_number`.
    pub async fn number_taken(
        pool: &PgPool,
        subject: SubjectRef,
        document_number: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let column = subject_column(subject.kind);
        let query = format!(
            "SELECT EXISTS(
                SELECT 1 FROM documents
                WHERE {column} = $1 AND document_number = $2
                  AND ($3::bigint IS NULL OR id <> $3)
             )"
        );
        let row: (bool,) = sqlx::query_as(&query)
            .bind(subject.id)
            .bind(document_number)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    // ── Writes (run inside the caller's transaction) ─────────────────

    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateDocument,
    ) -> Result<Document, sqlx::Error> {
        let query = format!(
            "WITH d AS (
                INSERT INTO documents
                    (vehicle_id, person_id, document_type_id, document_number, issue_date,
                     expiry_date, alert_window_days, state, file_stored_path,
                     file_original_name, file_mime_type, file_size_bytes, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING *
             )
             SELECT {COLUMNS} FROM d {JOINS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(input.vehicle_id)
            .bind(input.person_id)
            .bind(input.document_type_id)
            .bind(&input.document_number)
            .bind(input.issue_date)
            .bind(input.expiry_date)
            .bind(input.alert_window_days)
            .bind(&input.state)
            .bind(&input.file_stored_path)
            .bind(&input.file_original_name)
            .bind(&input.file_mime_type)
            .bind(input.file_size_bytes)
            .bind(&input.notes)
            .fetch_one(conn)
            .await
    }

    /// Replace every editable column. Returns `None` if no row has `id`.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &CreateDocument,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!(
            "WITH d AS (
                UPDATE documents SET
                    vehicle_id = $2,
                    person_id = $3,
                    document_type_id = $4,
                    document_number = $5,
                    issue_date = $6,
                    expiry_date = $7,
                    alert_window_days = $8,
                    state = $9,
                    file_stored_path = $10,
                    file_original_name = $11,
                    file_mime_type = $12,
                    file_size_bytes = $13,
                    notes = $14
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM d {JOINS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .bind(input.vehicle_id)
            .bind(input.person_id)
            .bind(input.document_type_id)
            .bind(&input.document_number)
            .bind(input.issue_date)
            .bind(input.expiry_date)
            .bind(input.alert_window_days)
            .bind(&input.state)
            .bind(&input.file_stored_path)
            .bind(&input.file_original_name)
            .bind(&input.file_mime_type)
            .bind(input.file_size_bytes)
            .bind(&input.notes)
            .fetch_optional(conn)
            .await
    }

    /// Permanently delete a document, returning the removed row.
    pub async fn hard_delete(pool: &PgPool, id: DbId) -> Result<Option<Document>, sqlx::Error> {
        let query = format!(
            "WITH d AS (DELETE FROM documents WHERE id = $1 RETURNING *)
             SELECT {COLUMNS} FROM d {JOINS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Apply state transitions in one statement.
    ///
    /// A row is only updated while it still holds the snapshot the transition
    /// was derived from: the same state, expiry date and effective alert
    /// window. Returns the number of rows updated.
    pub async fn apply_transitions(
        pool: &PgPool,
        transitions: &[StateTransition],
    ) -> Result<u64, sqlx::Error> {
        let ids: Vec<DbId> = transitions.iter().map(|t| t.id).collect();
        let new_states: Vec<String> = transitions
            .iter()
            .map(|t| t.new_state.as_str().to_string())
            .collect();
        let old_states: Vec<Option<String>> = transitions
            .iter()
            .map(|t| t.old_state.map(|s| s.as_str().to_string()))
            .collect();
        let expiry_dates: Vec<CalendarDate> = transitions.iter().map(|t| t.expiry_date).collect();
        let windows: Vec<i32> = transitions.iter().map(|t| t.alert_window_days).collect();

        let result = sqlx::query(
            "UPDATE documents d SET state = t.new_state \
             FROM UNNEST($1::bigint[], $2::text[], $3::text[], $4::date[], $5::int[]) \
                  AS t(id, new_state, old_state, expiry_date, alert_window_days), \
                  document_types dt \
             WHERE d.id = t.id \
               AND dt.id = d.document_type_id \
               AND d.state IS NOT DISTINCT FROM t.old_state \
               AND d.expiry_date = t.expiry_date \
               AND COALESCE(d.alert_window_days, dt.default_alert_window_days) = t.alert_window_days",
        )
        .bind(&ids)
        .bind(&new_states)
        .bind(&old_states)
        .bind(&expiry_dates)
        .bind(&windows)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
