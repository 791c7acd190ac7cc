//! Tests for `AppError` → HTTP response mapping.
//!
//! These tests call `IntoResponse` directly on `AppError` values; no server
//! or database is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use fleetdocs_api::error::AppError;
use fleetdocs_core::document::SubjectRef;
use fleetdocs_core::error::{CoreError, ReferenceKind};
use fleetdocs_core::repository::StorageError;
use fleetdocs_core::upload::UploadError;
use http_body_util::BodyExt;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFound maps to 404 with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Document",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Document with id 42 not found");
}

#[tokio::test]
async fn lookup_not_found_returns_404() {
    let err = AppError::NotFound("No vehicle with plate 'XX'".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "No vehicle with plate 'XX'");
}

// ---------------------------------------------------------------------------
// Test: validation failures map to 400 and name the field
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::validation(
        "expiry_date",
        "must not be before issue_date",
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("expiry_date"));
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("invalid multipart body".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "invalid multipart body");
}

// ---------------------------------------------------------------------------
// Test: duplicate numbers and missing references
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_document_number_returns_409() {
    let err = AppError::Core(CoreError::DuplicateDocumentNumber {
        subject: SubjectRef::vehicle(3),
        document_number: "SOAT-001".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "DUPLICATE_DOCUMENT_NUMBER");
    assert!(json["error"].as_str().unwrap().contains("SOAT-001"));
}

#[tokio::test]
async fn reference_not_found_returns_422() {
    let err = AppError::Core(CoreError::ReferenceNotFound {
        kind: ReferenceKind::DocumentType,
        id: 99,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "REFERENCE_NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Test: upload policy rejections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsupported_type_returns_415() {
    let err = AppError::from(UploadError::UnsupportedType {
        mime_type: "text/plain".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(json["code"], "UNSUPPORTED_MEDIA_TYPE");
    assert!(json["error"].as_str().unwrap().contains("text/plain"));
}

#[tokio::test]
async fn too_large_returns_413() {
    let err = AppError::from(UploadError::TooLarge {
        size_bytes: 11 * 1024 * 1024,
        max_bytes: 10 * 1024 * 1024,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn truncated_body_returns_413_with_limit() {
    let err = AppError::from(UploadError::BodyTooLarge {
        max_bytes: 10 * 1024 * 1024,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["code"], "PAYLOAD_TOO_LARGE");
    assert!(json["error"].as_str().unwrap().contains("10485760"));
}

#[tokio::test]
async fn storage_failures_are_sanitized() {
    let err = AppError::from(UploadError::StorageFailure("disk full at /srv/docs".into()));
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "UPLOAD_STORAGE_FAILURE");
    assert!(!json["error"].as_str().unwrap().contains("/srv/docs"));

    let err = AppError::Core(CoreError::Storage(StorageError::new("connection reset")));
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: sqlx::Error::RowNotFound maps to 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sqlx_row_not_found_returns_404() {
    let err = AppError::Database(sqlx::Error::RowNotFound);

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}
