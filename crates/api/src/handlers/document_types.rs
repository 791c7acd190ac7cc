//! Handlers for the `/document-types` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use fleetdocs_core::document::validate_document_type;
use fleetdocs_core::error::CoreError;
use fleetdocs_core::types::DbId;
use fleetdocs_db::models::document_type::{CreateDocumentType, DocumentType, UpdateDocumentType};
use fleetdocs_db::repositories::DocumentTypeRepo;

use crate::error::{AppError, AppResult};
use crate::query::DocumentTypeListParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "DocumentType",
        id,
    })
}

/// GET /api/v1/document-types
///
/// Active types by default; `?include_inactive=true` lists all.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<DocumentTypeListParams>,
) -> AppResult<Json<DataResponse<Vec<DocumentType>>>> {
    let types = DocumentTypeRepo::list(
        &state.pool,
        state.config.default_client_id,
        params.subject_kind,
        params.include_inactive,
    )
    .await?;
    Ok(Json(DataResponse { data: types }))
}

/// POST /api/v1/document-types
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateDocumentType>,
) -> AppResult<(StatusCode, Json<DataResponse<DocumentType>>)> {
    validate_document_type(
        &input.name,
        input.description.as_deref(),
        input.default_alert_window_days,
    )?;
    let created =
        DocumentTypeRepo::create(&state.pool, state.config.default_client_id, &input).await?;
    tracing::info!(
        document_type_id = created.id,
        subject_kind = %created.subject_kind,
        name = %created.name,
        "Document type created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/document-types/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DocumentType>>> {
    let found = DocumentTypeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: found }))
}

/// PUT /api/v1/document-types/{id}
///
/// Window changes take effect on documents without an override at the next
/// reconciliation.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDocumentType>,
) -> AppResult<Json<DataResponse<DocumentType>>> {
    let existing = DocumentTypeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    validate_document_type(
        input.name.as_deref().unwrap_or(&existing.name),
        input.description.as_deref(),
        input.default_alert_window_days,
    )?;

    let updated = DocumentTypeRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/document-types/{id}
///
/// Deactivates the type. Existing documents keep it; new ones cannot use it.
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if DocumentTypeRepo::deactivate(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
