//! HTTP-level integration tests for vehicle and person lookups.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, get, insert_person, insert_vehicle, post_multipart, seeded_type, Multipart, TestApp,
};
use sqlx::PgPool;

async fn register(app: &TestApp, kind: &str, subject_id: i64, type_id: i64, number: &str) {
    let form = Multipart::new()
        .text("subject_kind", kind)
        .text("subject_id", &subject_id.to_string())
        .text("document_type_id", &type_id.to_string())
        .text("document_number", number)
        .text("expiry_date", "2025-07-11");
    let response = post_multipart(app.router(), "/api/v1/documents", form).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn vehicle_lookup_by_plate_ignores_formatting(pool: PgPool) {
    let vehicle_id = insert_vehicle(&pool, "KXTR21").await;
    let soat = seeded_type(&pool, "SOAT").await;
    let app = TestApp::new(pool);
    register(&app, "vehicle", vehicle_id, soat, "SOAT-1").await;

    let response = get(app.router(), "/api/v1/vehicles/by-plate/kx-tr.21").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["subject"]["id"], vehicle_id);
    assert_eq!(json["data"]["subject"]["plate"], "KXTR21");
    assert_eq!(json["data"]["documents"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["documents"][0]["document_number"], "SOAT-1");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_plate_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/vehicles/by-plate/ZZZZ99").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn person_lookup_by_run_accepts_formatted_input(pool: PgPool) {
    let person_id = insert_person(&pool, "15678234", "K").await;
    let licencia = seeded_type(&pool, "Licencia de Conducir").await;
    let app = TestApp::new(pool);
    register(&app, "person", person_id, licencia, "LIC-1").await;

    let response = get(app.router(), "/api/v1/persons/by-run/15.678.234-K").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["subject"]["id"], person_id);
    assert_eq!(json["data"]["documents"][0]["document_number"], "LIC-1");
    assert_eq!(json["data"]["documents"][0]["state"], "por_vencer");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_run_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/persons/by-run/abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn subject_document_listings(pool: PgPool) {
    let vehicle_id = insert_vehicle(&pool, "BBCL90").await;
    let person_id = insert_person(&pool, "9876543", "2").await;
    let soat = seeded_type(&pool, "SOAT").await;
    let app = TestApp::new(pool);
    register(&app, "vehicle", vehicle_id, soat, "SOAT-1").await;
    register(&app, "vehicle", vehicle_id, soat, "SOAT-2").await;

    let json =
        body_json(get(app.router(), &format!("/api/v1/vehicles/{vehicle_id}/documents")).await)
            .await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let json =
        body_json(get(app.router(), &format!("/api/v1/persons/{person_id}/documents")).await)
            .await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let response = get(app.router(), "/api/v1/vehicles/999999/documents").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
