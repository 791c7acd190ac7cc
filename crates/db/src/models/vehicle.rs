//! Vehicle entity model (read-only for the document engine).

use fleetdocs_core::document::{Subject, SubjectRef};
use fleetdocs_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `vehicles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Vehicle {
    pub id: DbId,
    pub client_id: DbId,
    pub plate: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Vehicle {
    pub fn to_subject(&self) -> Subject {
        Subject {
            reference: SubjectRef::vehicle(self.id),
            label: self.plate.clone(),
            is_active: self.is_active,
        }
    }
}

/// Canonical plate form: uppercase with whitespace and dashes removed.
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
        .flat_map(char::to_uppercase)
        .collect()
}
