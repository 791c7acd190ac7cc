//! Document type entity model and DTOs.

use fleetdocs_core::document::{DocumentTypeInfo, SubjectKind};
use fleetdocs_core::error::CoreResult;
use fleetdocs_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `document_types` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentType {
    pub id: DbId,
    pub client_id: DbId,
    pub subject_kind: String,
    pub name: String,
    pub description: Option<String>,
    pub default_alert_window_days: i32,
    pub obligatory: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DocumentType {
    /// The fields the engine validates documents against.
    pub fn to_info(&self) -> CoreResult<DocumentTypeInfo> {
        Ok(DocumentTypeInfo {
            id: self.id,
            subject_kind: self.subject_kind.parse()?,
            name: self.name.clone(),
            default_alert_window_days: self.default_alert_window_days,
            obligatory: self.obligatory,
            is_active: self.is_active,
        })
    }
}

/// DTO for creating a new document type.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocumentType {
    pub subject_kind: SubjectKind,
    pub name: String,
    pub description: Option<String>,
    /// Defaults to 30 if omitted.
    pub default_alert_window_days: Option<i32>,
    /// Defaults to `false` if omitted.
    pub obligatory: Option<bool>,
}

/// DTO for updating a document type. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDocumentType {
    pub name: Option<String>,
    pub description: Option<String>,
    pub default_alert_window_days: Option<i32>,
    pub obligatory: Option<bool>,
    pub is_active: Option<bool>,
}
