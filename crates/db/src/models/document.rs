//! Document entity model and DTOs.

use fleetdocs_core::document::{DocumentFields, DocumentRecord, SubjectKind, SubjectRef};
use fleetdocs_core::error::{CoreError, CoreResult};
use fleetdocs_core::expiry::DocumentState;
use fleetdocs_core::repository::StorageError;
use fleetdocs_core::types::{CalendarDate, DbId, Timestamp};
use fleetdocs_core::upload::StoredFileHandle;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `documents` table, joined with its type and subject.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Document {
    pub id: DbId,
    pub vehicle_id: Option<DbId>,
    pub person_id: Option<DbId>,
    pub document_type_id: DbId,
    pub document_number: String,
    pub issue_date: Option<CalendarDate>,
    pub expiry_date: CalendarDate,
    /// Per-document override column.
    pub alert_window_days: Option<i32>,
    /// Override, else the type default.
    pub effective_alert_window_days: i32,
    pub state: Option<String>,
    pub file_stored_path: Option<String>,
    pub file_original_name: Option<String>,
    pub file_mime_type: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub document_type_name: String,
    /// Plate for vehicles, full name for persons.
    pub subject_label: String,
}

impl Document {
    pub fn subject(&self) -> CoreResult<SubjectRef> {
        match (self.vehicle_id, self.person_id) {
            (Some(id), None) => Ok(SubjectRef::vehicle(id)),
            (None, Some(id)) => Ok(SubjectRef::person(id)),
            _ => Err(StorageError::new(format!(
                "document {} does not reference exactly one subject",
                self.id
            ))
            .into()),
        }
    }

    pub fn attachment(&self) -> Option<StoredFileHandle> {
        match (&self.file_stored_path, &self.file_original_name) {
            (Some(stored_path), Some(original_name)) => Some(StoredFileHandle {
                stored_path: stored_path.clone(),
                original_name: original_name.clone(),
                mime_type: self
                    .file_mime_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                size_bytes: self.file_size_bytes.unwrap_or(0),
            }),
            _ => None,
        }
    }

    /// Convert into the engine's record type.
    ///
    /// Fails with a storage error if the row holds an unknown state string.
    pub fn to_record(&self) -> CoreResult<DocumentRecord> {
        let state = self
            .state
            .as_deref()
            .map(str::parse::<DocumentState>)
            .transpose()
            .map_err(|e| {
                CoreError::from(StorageError::with_source(
                    format!("document {} has an invalid state", self.id),
                    e,
                ))
            })?;

        Ok(DocumentRecord {
            id: self.id,
            subject: self.subject()?,
            document_type_id: self.document_type_id,
            document_number: self.document_number.clone(),
            issue_date: self.issue_date,
            expiry_date: self.expiry_date,
            alert_window_days: self.effective_alert_window_days,
            alert_window_override: self.alert_window_days,
            state,
            attachment: self.attachment(),
            notes: self.notes.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Column values written on insert and on full update.
#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub vehicle_id: Option<DbId>,
    pub person_id: Option<DbId>,
    pub document_type_id: DbId,
    pub document_number: String,
    pub issue_date: Option<CalendarDate>,
    pub expiry_date: CalendarDate,
    pub alert_window_days: Option<i32>,
    pub state: String,
    pub file_stored_path: Option<String>,
    pub file_original_name: Option<String>,
    pub file_mime_type: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub notes: Option<String>,
}

impl From<&DocumentFields> for CreateDocument {
    fn from(fields: &DocumentFields) -> Self {
        let (vehicle_id, person_id) = match fields.subject.kind {
            SubjectKind::Vehicle => (Some(fields.subject.id), None),
            SubjectKind::Person => (None, Some(fields.subject.id)),
        };
        let file = fields.attachment.as_ref();
        Self {
            vehicle_id,
            person_id,
            document_type_id: fields.document_type_id,
            document_number: fields.document_number.clone(),
            issue_date: fields.issue_date,
            expiry_date: fields.expiry_date,
            alert_window_days: fields.alert_window_override,
            state: fields.state.as_str().to_string(),
            file_stored_path: file.map(|f| f.stored_path.clone()),
            file_original_name: file.map(|f| f.original_name.clone()),
            file_mime_type: file.map(|f| f.mime_type.clone()),
            file_size_bytes: file.map(|f| f.size_bytes),
            notes: fields.notes.clone(),
        }
    }
}

/// Listing filter. `None` fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub subject_kind: Option<SubjectKind>,
    pub state: Option<DocumentState>,
}

/// Document counts per cached state.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct DocumentStats {
    pub total: i64,
    pub vigente: i64,
    pub por_vencer: i64,
    pub vencido: i64,
}
