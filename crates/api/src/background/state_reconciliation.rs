//! Periodic reconciliation of cached document states.
//!
//! Documents drift from `vigente` to `por_vencer` to `vencido` as days pass
//! without anyone touching them. This job re-classifies every active
//! document on a fixed interval so listings and stats stay current.

use std::sync::Arc;
use std::time::Duration;

use fleetdocs_core::repository::DocumentRepository;
use fleetdocs_core::service::DocumentService;
use fleetdocs_core::upload::UploadSink;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the reconciliation loop until `cancel` is triggered.
///
/// The first pass runs immediately. Failures are logged and retried on the
/// next tick.
pub async fn run<R, S>(
    service: Arc<DocumentService<R, S>>,
    every: Duration,
    cancel: CancellationToken,
) where
    R: DocumentRepository,
    S: UploadSink,
{
    tracing::info!(
        interval_secs = every.as_secs(),
        "State reconciliation job started"
    );

    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("State reconciliation job stopping");
                break;
            }
            _ = interval.tick() => {
                match service.reconcile_now().await {
                    Ok(report) if report.applied > 0 => {
                        tracing::info!(
                            examined = report.examined,
                            applied = report.applied,
                            "State reconciliation: states updated"
                        );
                    }
                    Ok(_) => {
                        tracing::debug!("State reconciliation: all states current");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "State reconciliation: pass failed");
                    }
                }
            }
        }
    }
}
