//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use keystock_core::config::AppConfig;
use keystock_core::traits::MirrorStore;
use keystock_database::DatabasePool;
use keystock_database::repositories::{GrantRepository, KeyRepository};
use keystock_service::{AccessService, AllocationService, ImportService, ReportService};

/// Shared application state passed to all Axum handlers via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Database pool.
    pub db: DatabasePool,
    /// Per-pool mirror files.
    pub mirror: Arc<dyn MirrorStore>,

    /// Access checks and grant management.
    pub access_service: Arc<AccessService>,
    /// Key import.
    pub import_service: Arc<ImportService>,
    /// Key allocation.
    pub allocation_service: Arc<AllocationService>,
    /// Counts, clearing, and mirror repair.
    pub report_service: Arc<ReportService>,
}

impl AppState {
    /// Wires repositories and services on top of a connected database and a
    /// mirror store.
    pub fn new(config: AppConfig, db: DatabasePool, mirror: Arc<dyn MirrorStore>) -> Self {
        let inventory = Arc::new(config.inventory.clone());
        let log_full_key = config.logging.log_full_key;

        let key_repo = Arc::new(KeyRepository::new(db.pool().clone()));
        let grant_repo = Arc::new(GrantRepository::new(db.pool().clone()));

        let access_service = Arc::new(AccessService::new(Arc::clone(&inventory), grant_repo));
        let import_service = Arc::new(ImportService::new(
            Arc::clone(&inventory),
            Arc::clone(&key_repo),
            Arc::clone(&mirror),
            Arc::clone(&access_service),
        ));
        let allocation_service = Arc::new(AllocationService::new(
            Arc::clone(&inventory),
            Arc::clone(&key_repo),
            Arc::clone(&mirror),
            Arc::clone(&access_service),
            log_full_key,
        ));
        let report_service = Arc::new(ReportService::new(
            Arc::clone(&inventory),
            Arc::clone(&key_repo),
            Arc::clone(&mirror),
            Arc::clone(&access_service),
        ));

        Self {
            config: Arc::new(config),
            db,
            mirror,
            access_service,
            import_service,
            allocation_service,
            report_service,
        }
    }
}
