//! Person entity model (read-only for the document engine).

use fleetdocs_core::document::{Subject, SubjectRef};
use fleetdocs_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `persons` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Person {
    pub id: DbId,
    pub client_id: DbId,
    pub run_number: String,
    pub run_check: String,
    pub first_names: String,
    pub last_names: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names, self.last_names)
    }

    pub fn to_subject(&self) -> Subject {
        Subject {
            reference: SubjectRef::person(self.id),
            label: self.full_name(),
            is_active: self.is_active,
        }
    }
}

/// Extract the RUN body from `12345678`, `12.345.678` or `12345678-9`.
///
/// Returns `None` when no digits remain.
pub fn run_body(raw: &str) -> Option<String> {
    let body = raw.split('-').next().unwrap_or("");
    let digits: String = body.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}
