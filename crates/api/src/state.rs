use std::sync::Arc;

use fleetdocs_core::clock::Clock;
use fleetdocs_core::service::DocumentService;
use fleetdocs_db::PgDocumentStore;

use crate::config::ServerConfig;
use crate::upload::LocalDiskSink;

/// The document service as wired for production.
pub type Documents = DocumentService<PgDocumentStore, LocalDiskSink>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: fleetdocs_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Time source for classification and derived fields.
    pub clock: Arc<dyn Clock>,
    /// Document lifecycle service (validation, uploads, persistence).
    pub documents: Arc<Documents>,
}

impl AppState {
    pub fn new(pool: fleetdocs_db::DbPool, config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let documents = DocumentService::new(
            PgDocumentStore::new(pool.clone()),
            LocalDiskSink::new(config.upload_dir.clone()),
            Arc::clone(&clock),
        )
        .with_max_upload_bytes(config.upload_max_bytes);

        Self {
            pool,
            config: Arc::new(config),
            clock,
            documents: Arc::new(documents),
        }
    }
}
