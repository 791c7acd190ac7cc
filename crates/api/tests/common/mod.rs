#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::NaiveDate;
use fleetdocs_api::config::ServerConfig;
use fleetdocs_api::router::build_app_router;
use fleetdocs_api::state::AppState;
use fleetdocs_core::clock::{Clock, FixedClock};
use fleetdocs_core::upload::MAX_UPLOAD_BYTES;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

/// The date every test app starts on.
pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout, and no background reconciliation.
pub fn test_config(upload_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        upload_dir,
        upload_max_bytes: MAX_UPLOAD_BYTES,
        reconcile_interval_secs: 0,
        default_client_id: 1,
    }
}

/// A router factory bound to one database, one upload directory and one
/// controllable clock.
pub struct TestApp {
    pub state: AppState,
    pub config: ServerConfig,
    pub clock: Arc<FixedClock>,
    pub uploads: TempDir,
}

impl TestApp {
    pub fn new(pool: PgPool) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let config = test_config(uploads.path().to_path_buf());
        let clock = Arc::new(FixedClock::on_date(test_today()));
        let state = AppState::new(pool, config.clone(), Arc::clone(&clock) as Arc<dyn Clock>);
        Self {
            state,
            config,
            clock,
            uploads,
        }
    }

    /// A fresh router over the shared state (each `oneshot` consumes one).
    pub fn router(&self) -> Router {
        build_app_router(self.state.clone(), &self.config)
    }

    /// Number of files currently in the upload directory.
    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.uploads.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config(std::env::temp_dir().join("fleetdocs-api-tests"));
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::on_date(test_today()));
    let state = AppState::new(pool, config.clone(), clock);
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn insert_vehicle(pool: &PgPool, plate: &str) -> i64 {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO vehicles (client_id, plate, brand, model) \
         VALUES (1, $1, 'Mercedes-Benz', 'Sprinter') RETURNING id",
    )
    .bind(plate)
    .fetch_one(pool)
    .await
    .unwrap();
    row.0
}

pub async fn insert_person(pool: &PgPool, run_number: &str, run_check: &str) -> i64 {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO persons (client_id, run_number, run_check, first_names, last_names) \
         VALUES (1, $1, $2, 'Camila', 'Soto Fuentes') RETURNING id",
    )
    .bind(run_number)
    .bind(run_check)
    .fetch_one(pool)
    .await
    .unwrap();
    row.0
}

/// Id of a seeded document type.
pub async fn seeded_type(pool: &PgPool, name: &str) -> i64 {
    let row: (i64,) =
        sqlx::query_as("SELECT id FROM document_types WHERE client_id = 1 AND name = $1")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap();
    row.0
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::delete(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::post(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::put(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "fleetdocs-test-boundary";

/// A file part for [`Multipart::file`].
pub struct FilePart<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: Vec<u8>,
}

/// Minimal `multipart/form-data` body builder.
#[derive(Default)]
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, part: FilePart<'_>) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                part.file_name, part.content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(&part.data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

async fn send_multipart(app: Router, method: &str, uri: &str, form: Multipart) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(form.finish()))
        .unwrap();
    send(app, request).await
}

pub async fn post_multipart(app: Router, uri: &str, form: Multipart) -> Response<Body> {
    send_multipart(app, "POST", uri, form).await
}

pub async fn put_multipart(app: Router, uri: &str, form: Multipart) -> Response<Body> {
    send_multipart(app, "PUT", uri, form).await
}

pub fn pdf(file_name: &str, size: usize) -> FilePart<'_> {
    let mut data = b"%PDF-1.7\n".to_vec();
    data.resize(size.max(data.len()), b'0');
    FilePart {
        file_name,
        content_type: "application/pdf",
        data,
    }
}
