//! Subject lookups: vehicles by plate, persons by RUN, and each subject's
//! documents.

use axum::extract::{Path, State};
use axum::Json;
use fleetdocs_core::document::SubjectRef;
use fleetdocs_core::error::CoreError;
use fleetdocs_core::types::DbId;
use fleetdocs_db::models::person::{run_body, Person};
use fleetdocs_db::models::vehicle::Vehicle;
use fleetdocs_db::repositories::{DocumentRepo, PersonRepo, VehicleRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::documents::{refresh_states, views, DocumentView};
use crate::response::DataResponse;
use crate::state::AppState;

/// A subject together with its documents, most severe first.
#[derive(Debug, Serialize)]
pub struct SubjectDocuments<T> {
    pub subject: T,
    pub documents: Vec<DocumentView>,
}

async fn documents_of(state: &AppState, subject: SubjectRef) -> AppResult<Vec<DocumentView>> {
    refresh_states(state).await?;
    let rows = DocumentRepo::list_by_subject(&state.pool, subject).await?;
    Ok(views(rows, state.clock.today()))
}

/// GET /api/v1/vehicles/by-plate/{plate}
pub async fn vehicle_by_plate(
    State(state): State<AppState>,
    Path(plate): Path<String>,
) -> AppResult<Json<DataResponse<SubjectDocuments<Vehicle>>>> {
    let vehicle = VehicleRepo::find_by_plate(&state.pool, state.config.default_client_id, &plate)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No vehicle with plate '{plate}'")))?;
    let documents = documents_of(&state, SubjectRef::vehicle(vehicle.id)).await?;
    Ok(Json(DataResponse {
        data: SubjectDocuments {
            subject: vehicle,
            documents,
        },
    }))
}

/// GET /api/v1/vehicles/{id}/documents
pub async fn vehicle_documents(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<DocumentView>>>> {
    VehicleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Vehicle",
            id,
        }))?;
    let documents = documents_of(&state, SubjectRef::vehicle(id)).await?;
    Ok(Json(DataResponse { data: documents }))
}

/// GET /api/v1/persons/by-run/{run}
///
/// Accepts `12345678`, `12.345.678` or `12345678-9`.
pub async fn person_by_run(
    State(state): State<AppState>,
    Path(run): Path<String>,
) -> AppResult<Json<DataResponse<SubjectDocuments<Person>>>> {
    let body = run_body(&run)
        .ok_or_else(|| AppError::BadRequest(format!("'{run}' is not a valid RUN")))?;
    let person = PersonRepo::find_by_run(&state.pool, state.config.default_client_id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No person with RUN '{run}'")))?;
    let documents = documents_of(&state, SubjectRef::person(person.id)).await?;
    Ok(Json(DataResponse {
        data: SubjectDocuments {
            subject: person,
            documents,
        },
    }))
}

/// GET /api/v1/persons/{id}/documents
pub async fn person_documents(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<DocumentView>>>> {
    PersonRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Person",
            id,
        }))?;
    let documents = documents_of(&state, SubjectRef::person(id)).await?;
    Ok(Json(DataResponse { data: documents }))
}
