//! Document records, subject references, and the pure validation rules that
//! apply to them before any storage lookup happens.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{CoreError, CoreResult, ReferenceKind};
use crate::expiry::{self, DocumentState, DEFAULT_ALERT_WINDOW_DAYS};
use crate::types::{CalendarDate, DbId, Timestamp};
use crate::upload::StoredFileHandle;

/// Accepted wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Upper bound for any alert window, in days (ten years).
pub const MAX_ALERT_WINDOW_DAYS: i32 = 3650;

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

/// The two kinds of entity a document can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Vehicle,
    Person,
}

impl SubjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Person => "person",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vehicle" => Ok(Self::Vehicle),
            "person" => Ok(Self::Person),
            other => Err(CoreError::validation(
                "subject_kind",
                format!("Invalid subject kind '{other}'. Must be one of: vehicle, person"),
            )),
        }
    }
}

/// Reference to the vehicle or person that owns a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    pub kind: SubjectKind,
    pub id: DbId,
}

impl SubjectRef {
    pub fn vehicle(id: DbId) -> Self {
        Self {
            kind: SubjectKind::Vehicle,
            id,
        }
    }

    pub fn person(id: DbId) -> Self {
        Self {
            kind: SubjectKind::Person,
            id,
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// A subject as seen by the engine: identity, display label and active flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub reference: SubjectRef,
    pub label: String,
    pub is_active: bool,
}

/// The parts of a document type the engine needs for validation and classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentTypeInfo {
    pub id: DbId,
    pub subject_kind: SubjectKind,
    pub name: String,
    pub default_alert_window_days: i32,
    pub obligatory: bool,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A stored document together with its cached lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRecord {
    pub id: DbId,
    pub subject: SubjectRef,
    pub document_type_id: DbId,
    pub document_number: String,
    pub issue_date: Option<CalendarDate>,
    pub expiry_date: CalendarDate,
    /// Effective alert window: the per-record override or the type default.
    pub alert_window_days: i32,
    /// Per-record override, if one was set.
    pub alert_window_override: Option<i32>,
    /// Cached state; `None` for rows never classified.
    pub state: Option<DocumentState>,
    pub attachment: Option<StoredFileHandle>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DocumentRecord {
    /// The state this record should have on `today`.
    pub fn computed_state(&self, today: CalendarDate) -> DocumentState {
        expiry::classify(self.expiry_date, self.alert_window_days, today)
    }

    pub fn days_remaining(&self, today: CalendarDate) -> i64 {
        expiry::days_remaining(self.expiry_date, today)
    }

    /// Whether the cached state matches what `today` demands.
    pub fn is_state_current(&self, today: CalendarDate) -> bool {
        self.state == Some(self.computed_state(today))
    }
}

/// Caller-supplied fields for registering a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDraft {
    pub subject: SubjectRef,
    pub document_type_id: DbId,
    pub document_number: String,
    pub issue_date: Option<CalendarDate>,
    pub expiry_date: CalendarDate,
    /// Per-record override of the type's alert window.
    pub alert_window_days: Option<i32>,
    pub notes: Option<String>,
}

impl DocumentDraft {
    /// Rebuild a draft from a stored record (used as the base for edits).
    pub fn from_record(record: &DocumentRecord) -> Self {
        Self {
            subject: record.subject,
            document_type_id: record.document_type_id,
            document_number: record.document_number.clone(),
            issue_date: record.issue_date,
            expiry_date: record.expiry_date,
            alert_window_days: record.alert_window_override,
            notes: record.notes.clone(),
        }
    }

    /// Overlay a patch; `None` fields keep their current value.
    pub fn merged(mut self, patch: DocumentPatch) -> Self {
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(type_id) = patch.document_type_id {
            self.document_type_id = type_id;
        }
        if let Some(number) = patch.document_number {
            self.document_number = number;
        }
        if let Some(issue) = patch.issue_date {
            self.issue_date = issue;
        }
        if let Some(expiry) = patch.expiry_date {
            self.expiry_date = expiry;
        }
        if let Some(window) = patch.alert_window_days {
            self.alert_window_days = window;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        self
    }
}

/// Partial edit of a document.
///
/// Outer `None` keeps the current value. For the optional fields,
/// `Some(None)` clears the stored value; a cleared `alert_window_days`
/// falls back to the document type's default window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    pub subject: Option<SubjectRef>,
    pub document_type_id: Option<DbId>,
    pub document_number: Option<String>,
    pub issue_date: Option<Option<CalendarDate>>,
    pub expiry_date: Option<CalendarDate>,
    pub alert_window_days: Option<Option<i32>>,
    pub notes: Option<Option<String>>,
}

/// Fully validated and classified values written by `insert` / `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFields {
    pub subject: SubjectRef,
    pub document_type_id: DbId,
    pub document_number: String,
    pub issue_date: Option<CalendarDate>,
    pub expiry_date: CalendarDate,
    pub alert_window_override: Option<i32>,
    pub state: DocumentState,
    pub attachment: Option<StoredFileHandle>,
    pub notes: Option<String>,
}

/// A draft that passed every check, with its effective alert window resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDocument {
    pub draft: DocumentDraft,
    pub alert_window_days: i32,
}

impl ValidatedDocument {
    pub fn classify(&self, today: CalendarDate) -> DocumentState {
        expiry::classify(self.draft.expiry_date, self.alert_window_days, today)
    }

    /// Attach the computed state and the stored upload, producing storable fields.
    pub fn into_fields(
        self,
        state: DocumentState,
        attachment: Option<StoredFileHandle>,
    ) -> DocumentFields {
        DocumentFields {
            subject: self.draft.subject,
            document_type_id: self.draft.document_type_id,
            document_number: self.draft.document_number,
            issue_date: self.draft.issue_date,
            expiry_date: self.draft.expiry_date,
            alert_window_override: self.draft.alert_window_days,
            state,
            attachment,
            notes: self.draft.notes,
        }
    }
}

// ---------------------------------------------------------------------------
// Pure validation
// ---------------------------------------------------------------------------

/// Parse a `YYYY-MM-DD` calendar date for the named field.
pub fn parse_date(field: &str, raw: &str) -> CoreResult<CalendarDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(field, "is required"));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| {
        CoreError::validation(
            field,
            format!("'{trimmed}' is not a valid date (expected YYYY-MM-DD)"),
        )
    })
}

/// Parse an optional date: blank input means "not provided".
pub fn parse_optional_date(field: &str, raw: Option<&str>) -> CoreResult<Option<CalendarDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(field, value).map(Some),
    }
}

/// Trim a document number and reject it when nothing is left.
pub fn normalize_document_number(raw: &str) -> CoreResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation("document_number", "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Field-level checks that need no storage access.
///
/// Returns the draft with its document number trimmed and blank notes dropped.
pub fn validate_draft_fields(mut draft: DocumentDraft) -> CoreResult<DocumentDraft> {
    draft.document_number = normalize_document_number(&draft.document_number)?;

    if let Some(issue) = draft.issue_date {
        if issue > draft.expiry_date {
            return Err(CoreError::validation(
                "issue_date",
                format!(
                    "issue date {issue} is after expiry date {}",
                    draft.expiry_date
                ),
            ));
        }
    }

    if let Some(window) = draft.alert_window_days {
        if !(0..=MAX_ALERT_WINDOW_DAYS).contains(&window) {
            return Err(CoreError::validation(
                "alert_window_days",
                format!("must be between 0 and {MAX_ALERT_WINDOW_DAYS}"),
            ));
        }
    }

    draft.notes = draft
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(draft)
}

/// Check a subject lookup result: it must exist and be active.
pub fn check_subject(reference: SubjectRef, found: Option<&Subject>) -> CoreResult<()> {
    match found {
        Some(subject) if subject.is_active => Ok(()),
        _ => Err(CoreError::ReferenceNotFound {
            kind: ReferenceKind::Subject,
            id: reference.id,
        }),
    }
}

/// Check a document type lookup result against the subject it will be attached to.
///
/// Returns the effective alert window for the document.
pub fn check_document_type(
    type_id: DbId,
    subject: SubjectRef,
    found: Option<&DocumentTypeInfo>,
    override_days: Option<i32>,
) -> CoreResult<i32> {
    let doc_type = match found {
        Some(t) if t.is_active => t,
        _ => {
            return Err(CoreError::ReferenceNotFound {
                kind: ReferenceKind::DocumentType,
                id: type_id,
            })
        }
    };
    if doc_type.subject_kind != subject.kind {
        return Err(CoreError::validation(
            "document_type_id",
            format!(
                "document type '{}' applies to {} documents, not {}",
                doc_type.name, doc_type.subject_kind, subject.kind
            ),
        ));
    }
    Ok(effective_alert_window(
        override_days,
        Some(doc_type.default_alert_window_days),
    ))
}

/// Resolve the alert window: record override, then type default, then 30.
pub fn effective_alert_window(override_days: Option<i32>, type_default: Option<i32>) -> i32 {
    override_days
        .or(type_default)
        .unwrap_or(DEFAULT_ALERT_WINDOW_DAYS)
}

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

#[derive(Debug, Validate)]
struct DocumentTypeFields {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    name: String,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    description: Option<String>,
    #[validate(range(min = 0, max = 3650, message = "must be between 0 and 3650"))]
    default_alert_window_days: Option<i32>,
}

/// Validate user-supplied document type fields.
pub fn validate_document_type(
    name: &str,
    description: Option<&str>,
    default_alert_window_days: Option<i32>,
) -> CoreResult<()> {
    let fields = DocumentTypeFields {
        name: name.trim().to_string(),
        description: description.map(str::to_string),
        default_alert_window_days,
    };
    fields.validate().map_err(|errors| {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "document_type".to_string());
        CoreError::validation(field, errors.to_string())
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> CalendarDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> DocumentDraft {
        DocumentDraft {
            subject: SubjectRef::vehicle(7),
            document_type_id: 3,
            document_number: "  SOAT-123 ".to_string(),
            issue_date: Some(date(2025, 1, 1)),
            expiry_date: date(2026, 1, 1),
            alert_window_days: None,
            notes: Some("   ".to_string()),
        }
    }

    fn doc_type(kind: SubjectKind, active: bool) -> DocumentTypeInfo {
        DocumentTypeInfo {
            id: 3,
            subject_kind: kind,
            name: "SOAT".to_string(),
            default_alert_window_days: 45,
            obligatory: true,
            is_active: active,
        }
    }

    #[test]
    fn parse_date_accepts_iso() {
        assert_eq!(parse_date("expiry_date", "2025-02-28").unwrap(), date(2025, 2, 28));
    }

    #[test]
    fn parse_date_rejects_impossible_date() {
        let err = parse_date("expiry_date", "2025-02-30").unwrap_err();
        assert_matches!(err, CoreError::Validation { ref field, .. } if field == "expiry_date");
    }

    #[test]
    fn parse_date_rejects_blank() {
        assert_matches!(
            parse_date("expiry_date", "  "),
            Err(CoreError::Validation { .. })
        );
    }

    #[test]
    fn optional_date_blank_is_none() {
        assert_eq!(parse_optional_date("issue_date", Some("")).unwrap(), None);
        assert_eq!(parse_optional_date("issue_date", None).unwrap(), None);
    }

    #[test]
    fn draft_number_is_trimmed_and_blank_notes_dropped() {
        let validated = validate_draft_fields(draft()).unwrap();
        assert_eq!(validated.document_number, "SOAT-123");
        assert_eq!(validated.notes, None);
    }

    #[test]
    fn empty_document_number_rejected() {
        let mut d = draft();
        d.document_number = "   ".to_string();
        let err = validate_draft_fields(d).unwrap_err();
        assert_matches!(err, CoreError::Validation { ref field, .. } if field == "document_number");
    }

    #[test]
    fn issue_after_expiry_rejected() {
        let mut d = draft();
        d.issue_date = Some(date(2026, 6, 1));
        let err = validate_draft_fields(d).unwrap_err();
        assert_matches!(err, CoreError::Validation { ref field, .. } if field == "issue_date");
    }

    #[test]
    fn issue_equal_to_expiry_allowed() {
        let mut d = draft();
        d.issue_date = Some(d.expiry_date);
        assert!(validate_draft_fields(d).is_ok());
    }

    #[test]
    fn negative_override_rejected() {
        let mut d = draft();
        d.alert_window_days = Some(-1);
        let err = validate_draft_fields(d).unwrap_err();
        assert_matches!(err, CoreError::Validation { ref field, .. } if field == "alert_window_days");
    }

    #[test]
    fn inactive_subject_is_reference_not_found() {
        let subject = Subject {
            reference: SubjectRef::person(4),
            label: "Ana Rojas".to_string(),
            is_active: false,
        };
        assert_matches!(
            check_subject(subject.reference, Some(&subject)),
            Err(CoreError::ReferenceNotFound {
                kind: ReferenceKind::Subject,
                id: 4
            })
        );
        assert_matches!(
            check_subject(SubjectRef::person(9), None),
            Err(CoreError::ReferenceNotFound { id: 9, .. })
        );
    }

    #[test]
    fn document_type_default_window_applies() {
        let t = doc_type(SubjectKind::Vehicle, true);
        let window = check_document_type(3, SubjectRef::vehicle(1), Some(&t), None).unwrap();
        assert_eq!(window, 45);
    }

    #[test]
    fn record_override_beats_type_default() {
        let t = doc_type(SubjectKind::Vehicle, true);
        let window = check_document_type(3, SubjectRef::vehicle(1), Some(&t), Some(10)).unwrap();
        assert_eq!(window, 10);
    }

    #[test]
    fn document_type_kind_mismatch_rejected() {
        let t = doc_type(SubjectKind::Person, true);
        let err = check_document_type(3, SubjectRef::vehicle(1), Some(&t), None).unwrap_err();
        assert_matches!(err, CoreError::Validation { ref field, .. } if field == "document_type_id");
    }

    #[test]
    fn inactive_document_type_is_reference_not_found() {
        let t = doc_type(SubjectKind::Vehicle, false);
        assert_matches!(
            check_document_type(3, SubjectRef::vehicle(1), Some(&t), None),
            Err(CoreError::ReferenceNotFound {
                kind: ReferenceKind::DocumentType,
                id: 3
            })
        );
    }

    #[test]
    fn fallback_window_is_thirty_days() {
        assert_eq!(effective_alert_window(None, None), 30);
    }

    #[test]
    fn patch_overlays_only_given_fields() {
        let base = validate_draft_fields(draft()).unwrap();
        let patched = base.clone().merged(DocumentPatch {
            expiry_date: Some(date(2027, 1, 1)),
            ..Default::default()
        });
        assert_eq!(patched.expiry_date, date(2027, 1, 1));
        assert_eq!(patched.document_number, base.document_number);
        assert_eq!(patched.subject, base.subject);
    }

    #[test]
    fn patch_clears_optional_fields() {
        let mut base = validate_draft_fields(draft()).unwrap();
        base.issue_date = Some(date(2025, 1, 1));
        base.alert_window_days = Some(45);
        base.notes = Some("renewal pending".to_string());

        let kept = base.clone().merged(DocumentPatch::default());
        assert_eq!(kept, base);

        let cleared = base.merged(DocumentPatch {
            issue_date: Some(None),
            alert_window_days: Some(None),
            notes: Some(None),
            ..Default::default()
        });
        assert_eq!(cleared.issue_date, None);
        assert_eq!(cleared.alert_window_days, None);
        assert_eq!(cleared.notes, None);
    }

    #[test]
    fn record_reports_stale_state() {
        let now = Utc::now();
        let record = DocumentRecord {
            id: 1,
            subject: SubjectRef::vehicle(1),
            document_type_id: 1,
            document_number: "X".to_string(),
            issue_date: None,
            expiry_date: date(2025, 5, 1),
            alert_window_days: 30,
            alert_window_override: None,
            state: Some(DocumentState::Vigente),
            attachment: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        assert!(record.is_state_current(date(2025, 3, 1)));
        assert!(!record.is_state_current(date(2025, 4, 15)));
        assert_eq!(record.days_remaining(date(2025, 4, 15)), 16);
    }

    #[test]
    fn subject_kind_parses_case_insensitively() {
        assert_eq!("Vehicle".parse::<SubjectKind>().unwrap(), SubjectKind::Vehicle);
        assert!("truck".parse::<SubjectKind>().is_err());
    }

    #[test]
    fn document_type_name_required() {
        let err = validate_document_type("  ", None, Some(30)).unwrap_err();
        assert_matches!(err, CoreError::Validation { ref field, .. } if field == "name");
    }

    #[test]
    fn document_type_window_range_checked() {
        let err = validate_document_type("SOAT", None, Some(-3)).unwrap_err();
        assert_matches!(
            err,
            CoreError::Validation { ref field, .. } if field == "default_alert_window_days"
        );
        assert!(validate_document_type("SOAT", Some("Seguro obligatorio"), Some(30)).is_ok());
    }
}
