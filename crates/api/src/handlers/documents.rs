//! Handlers for the `/documents` resource.
//!
//! Registration and edit take `multipart/form-data` so an attachment can be
//! sent alongside the fields. Every document returned carries the cached
//! `state` plus values derived from today's date. Reads that filter, order
//! or count by the cached state reconcile first.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Duration;
use fleetdocs_core::document::{
    parse_date, parse_optional_date, DocumentDraft, DocumentPatch, SubjectKind, SubjectRef,
    MAX_ALERT_WINDOW_DAYS,
};
use fleetdocs_core::error::CoreError;
use fleetdocs_core::expiry::{self, DocumentState, ExpiryTier};
use fleetdocs_core::reconcile::ReconcileReport;
use fleetdocs_core::types::{CalendarDate, DbId};
use fleetdocs_core::upload::{UploadError, UploadRequest};
use fleetdocs_db::models::document::{Document, DocumentFilter, DocumentStats};
use fleetdocs_db::repositories::DocumentRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::query::{
    clamp_limit, DocumentListParams, LimitParams, SubjectKindParams, UpcomingParams,
    DEFAULT_UPCOMING_DAYS,
};
use crate::response::DataResponse;
use crate::state::AppState;

/// A document with read-time derived fields.
#[derive(Debug, Serialize)]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: Document,
    pub subject_kind: Option<SubjectKind>,
    pub days_remaining: i64,
    /// State demanded by today's date; may lead the cached `state` until the
    /// next reconciliation.
    pub current_state: DocumentState,
    pub tier: ExpiryTier,
}

impl DocumentView {
    pub fn new(document: Document, today: CalendarDate) -> Self {
        let window = document.effective_alert_window_days;
        let subject_kind = document.subject().ok().map(|s| s.kind);
        Self {
            subject_kind,
            days_remaining: expiry::days_remaining(document.expiry_date, today),
            current_state: expiry::classify(document.expiry_date, window, today),
            tier: expiry::tier(document.expiry_date, window, today),
            document,
        }
    }
}

pub(crate) fn views(rows: Vec<Document>, today: CalendarDate) -> Vec<DocumentView> {
    rows.into_iter().map(|d| DocumentView::new(d, today)).collect()
}

/// Bring cached states up to date before a read that depends on them.
pub(crate) async fn refresh_states(state: &AppState) -> AppResult<()> {
    let report = state.documents.reconcile_now().await?;
    if report.applied > 0 {
        tracing::debug!(applied = report.applied, "Cached states refreshed before read");
    }
    Ok(())
}

async fn load_view(state: &AppState, id: DbId) -> AppResult<DocumentView> {
    let document = DocumentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Document",
            id,
        }))?;
    Ok(DocumentView::new(document, state.clock.today()))
}

// ---------------------------------------------------------------------------
// Multipart form
// ---------------------------------------------------------------------------

/// Raw multipart fields shared by register and edit.
#[derive(Debug, Default)]
struct DocumentForm {
    subject_kind: Option<String>,
    subject_id: Option<String>,
    document_type_id: Option<String>,
    document_number: Option<String>,
    issue_date: Option<String>,
    expiry_date: Option<String>,
    alert_window_days: Option<String>,
    notes: Option<String>,
    file: Option<UploadRequest>,
}

/// Map a multipart failure, reporting a body cut off by the size limit as an
/// oversized upload.
fn multipart_error(err: MultipartError, max_upload_bytes: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::BodyTooLarge {
            max_bytes: max_upload_bytes,
        }
        .into()
    } else {
        AppError::BadRequest(err.body_text())
    }
}

impl DocumentForm {
    async fn read(mut multipart: Multipart, max_upload_bytes: u64) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, max_upload_bytes))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                let original_name = field.file_name().unwrap_or("").to_string();
                let declared_mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_bytes))?;
                // Browsers send an empty part when no file was picked.
                if !original_name.is_empty() || !data.is_empty() {
                    form.file = Some(UploadRequest {
                        original_name,
                        declared_mime_type,
                        payload: data.to_vec(),
                    });
                }
                continue;
            }

            let slot = match name.as_str() {
                "subject_kind" => &mut form.subject_kind,
                "subject_id" => &mut form.subject_id,
                "document_type_id" => &mut form.document_type_id,
                "document_number" => &mut form.document_number,
                "issue_date" => &mut form.issue_date,
                "expiry_date" => &mut form.expiry_date,
                "alert_window_days" => &mut form.alert_window_days,
                "notes" => &mut form.notes,
                _ => continue, // ignore unknown fields
            };
            let text = field
                .text()
                .await
                .map_err(|e| multipart_error(e, max_upload_bytes))?;
            *slot = Some(text);
        }

        Ok(form)
    }

    /// The subject, when both halves were sent.
    fn subject(&self) -> AppResult<Option<SubjectRef>> {
        match (non_blank(&self.subject_kind), non_blank(&self.subject_id)) {
            (None, None) => Ok(None),
            (Some(kind), Some(id)) => Ok(Some(SubjectRef {
                kind: kind.parse()?,
                id: parse_id("subject_id", id)?,
            })),
            (None, Some(_)) => Err(CoreError::validation("subject_kind", "is required").into()),
            (Some(_), None) => Err(CoreError::validation("subject_id", "is required").into()),
        }
    }

    fn into_draft(self) -> AppResult<(DocumentDraft, Option<UploadRequest>)> {
        let subject = self
            .subject()?
            .ok_or_else(|| CoreError::validation("subject_kind", "is required"))?;
        let document_type_id = parse_id(
            "document_type_id",
            required(&self.document_type_id, "document_type_id")?,
        )?;
        let draft = DocumentDraft {
            subject,
            document_type_id,
            document_number: self.document_number.unwrap_or_default(),
            issue_date: parse_optional_date("issue_date", self.issue_date.as_deref())?,
            expiry_date: parse_date("expiry_date", self.expiry_date.as_deref().unwrap_or(""))?,
            alert_window_days: parse_window(&self.alert_window_days)?,
            notes: self.notes,
        };
        Ok((draft, self.file))
    }

    /// Absent fields keep their value; a blank `issue_date`,
    /// `alert_window_days` or `notes` clears it.
    fn into_patch(self) -> AppResult<(DocumentPatch, Option<UploadRequest>)> {
        let issue_date = match &self.issue_date {
            Some(raw) => Some(parse_optional_date("issue_date", Some(raw.as_str()))?),
            None => None,
        };
        let alert_window_days = match &self.alert_window_days {
            Some(_) => Some(parse_window(&self.alert_window_days)?),
            None => None,
        };
        let patch = DocumentPatch {
            subject: self.subject()?,
            document_type_id: non_blank(&self.document_type_id)
                .map(|v| parse_id("document_type_id", v))
                .transpose()?,
            document_number: self.document_number.clone(),
            issue_date,
            expiry_date: non_blank(&self.expiry_date)
                .map(|v| parse_date("expiry_date", v))
                .transpose()?,
            alert_window_days,
            notes: self.notes.map(Some),
        };
        Ok((patch, self.file))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, CoreError> {
    non_blank(value).ok_or_else(|| CoreError::validation(field, "is required"))
}

fn parse_id(field: &str, raw: &str) -> Result<DbId, CoreError> {
    raw.trim()
        .parse::<DbId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| CoreError::validation(field, format!("'{raw}' is not a valid id")))
}

fn parse_window(raw: &Option<String>) -> Result<Option<i32>, CoreError> {
    non_blank(raw)
        .map(|v| {
            v.parse::<i32>().map_err(|_| {
                CoreError::validation(
                    "alert_window_days",
                    format!("must be an integer between 0 and {MAX_ALERT_WINDOW_DAYS}"),
                )
            })
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/documents
///
/// List documents, most severe first. Optional `?subject_kind=` and `?state=`.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<DocumentListParams>,
) -> AppResult<Json<DataResponse<Vec<DocumentView>>>> {
    let filter = DocumentFilter {
        subject_kind: params.subject_kind,
        state: params.state,
    };
    refresh_states(&state).await?;
    let rows = DocumentRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse {
        data: views(rows, state.clock.today()),
    }))
}

/// POST /api/v1/documents
///
/// Register a document from a multipart form with an optional `file` part.
pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<DocumentView>>)> {
    let (draft, upload) = DocumentForm::read(multipart, state.config.upload_max_bytes)
        .await?
        .into_draft()?;
    let record = state.documents.register(draft, upload).await?;
    let view = load_view(&state, record.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /api/v1/documents/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DocumentView>>> {
    let view = load_view(&state, id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/documents/{id}
///
/// Partial edit from a multipart form. Omitted fields keep their value, blank
/// optional fields are cleared, and a `file` part replaces the attachment.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<DocumentView>>> {
    let (patch, upload) = DocumentForm::read(multipart, state.config.upload_max_bytes)
        .await?
        .into_patch()?;
    let record = state.documents.edit(id, patch, upload).await?;
    let view = load_view(&state, record.id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/v1/documents/{id}
///
/// Hard-deletes the document and its stored attachment.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.documents.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/documents/{id}/download
///
/// Stream the attachment back under its original file name.
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let document = DocumentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Document",
            id,
        }))?;
    let attachment = document
        .attachment()
        .ok_or_else(|| AppError::NotFound(format!("Document {id} has no attachment")))?;

    let bytes = state
        .documents
        .sink()
        .read(&attachment.stored_path)
        .await?
        .ok_or_else(|| {
            tracing::warn!(
                document_id = id,
                stored_path = %attachment.stored_path,
                "Attachment file missing"
            );
            AppError::NotFound(format!("Attachment file for document {id} is missing"))
        })?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, attachment.mime_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&attachment.original_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/v1/documents/stats
///
/// Counts per state over active subjects. Optional `?subject_kind=`.
pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<SubjectKindParams>,
) -> AppResult<Json<DataResponse<DocumentStats>>> {
    refresh_states(&state).await?;
    let stats = DocumentRepo::stats(&state.pool, params.subject_kind).await?;
    Ok(Json(DataResponse { data: stats }))
}

/// GET /api/v1/documents/upcoming
///
/// Documents expiring within `?days=` (default 30), soonest first, excluding
/// those already expired.
pub async fn upcoming(
    State(state): State<AppState>,
    Query(params): Query<UpcomingParams>,
) -> AppResult<Json<DataResponse<Vec<DocumentView>>>> {
    let days = params.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
    if !(0..=i64::from(MAX_ALERT_WINDOW_DAYS)).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "days must be between 0 and {MAX_ALERT_WINDOW_DAYS}"
        )));
    }
    let today = state.clock.today();
    let rows = DocumentRepo::list_upcoming(
        &state.pool,
        today,
        today + Duration::days(days),
        clamp_limit(params.limit),
    )
    .await?;
    Ok(Json(DataResponse {
        data: views(rows, today),
    }))
}

/// GET /api/v1/documents/recent
pub async fn recent(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<DataResponse<Vec<DocumentView>>>> {
    let rows = DocumentRepo::list_recent(&state.pool, clamp_limit(params.limit)).await?;
    Ok(Json(DataResponse {
        data: views(rows, state.clock.today()),
    }))
}

/// POST /api/v1/documents/reconcile
///
/// Run a reconciliation pass now and report the transitions applied.
pub async fn reconcile(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ReconcileReport>>> {
    let report = state.documents.reconcile_now().await?;
    Ok(Json(DataResponse { data: report }))
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name.
fn content_disposition(original_name: &str) -> String {
    let fallback: String = original_name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(original_name.len() * 3);
    for byte in original_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
