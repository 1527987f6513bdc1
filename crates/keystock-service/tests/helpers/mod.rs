//! Shared fixture for service integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use keystock_core::config::{DatabaseConfig, InventoryConfig};
use keystock_core::traits::MirrorStore;
use keystock_core::types::{PoolKey, PrincipalId};
use keystock_database::repositories::{GrantRepository, KeyRepository};
use keystock_database::{DatabasePool, migration};
use keystock_service::{
    AccessService, AllocationService, ImportService, ReportService, RequestContext,
};
use keystock_storage::LocalMirrorStore;

pub const OWNER: PrincipalId = PrincipalId(1);
pub const RESELLER: PrincipalId = PrincipalId(2);
pub const STRANGER: PrincipalId = PrincipalId(3);
pub const RECIPIENT: PrincipalId = PrincipalId(99);

/// A fully wired service stack on a temporary database and mirror dir.
pub struct TestInventory {
    _dir: tempfile::TempDir,
    pub mirror_dir: PathBuf,
    pub inventory: Arc<InventoryConfig>,
    pub key_repo: Arc<KeyRepository>,
    pub mirror: Arc<LocalMirrorStore>,
    pub access: Arc<AccessService>,
    pub import: ImportService,
    pub allocation: AllocationService,
    pub report: ReportService,
}

impl TestInventory {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mirror_dir = dir.path().join("stock");

        let inventory = Arc::new(InventoryConfig {
            owners: vec![OWNER.get()],
            mirror_dir: mirror_dir.display().to_string(),
            ..Default::default()
        });

        let db = DatabasePool::connect(&DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("keystock.db").display()),
            max_connections: 16,
            ..Default::default()
        })
        .await
        .unwrap();
        migration::run_migrations(db.pool()).await.unwrap();

        let key_repo = Arc::new(KeyRepository::new(db.pool().clone()));
        let grant_repo = Arc::new(GrantRepository::new(db.pool().clone()));
        let mirror = Arc::new(LocalMirrorStore::new(&mirror_dir).await.unwrap());
        let mirror_dyn: Arc<dyn MirrorStore> = mirror.clone();

        let access = Arc::new(AccessService::new(inventory.clone(), grant_repo));
        let import = ImportService::new(
            inventory.clone(),
            key_repo.clone(),
            mirror_dyn.clone(),
            access.clone(),
        );
        let allocation = AllocationService::new(
            inventory.clone(),
            key_repo.clone(),
            mirror_dyn.clone(),
            access.clone(),
            false,
        );
        let report = ReportService::new(inventory.clone(), key_repo.clone(), mirror_dyn, access.clone());

        Self {
            _dir: dir,
            mirror_dir,
            inventory,
            key_repo,
            mirror,
            access,
            import,
            allocation,
            report,
        }
    }

    /// Same as [`new`](Self::new) with `RESELLER` granted the `temp` program.
    pub async fn with_reseller() -> Self {
        let app = Self::new().await;
        app.access
            .grant(&app.owner(), RESELLER, "temp")
            .await
            .unwrap();
        app
    }

    pub fn owner(&self) -> RequestContext {
        self.access.context(OWNER)
    }

    pub fn ctx(&self, principal: PrincipalId) -> RequestContext {
        self.access.context(principal)
    }

    pub fn pool(&self, program: &str, duration: &str) -> PoolKey {
        self.inventory.pool(program, duration).unwrap()
    }

    /// Raw lines of a pool's mirror file, or an empty list if missing.
    pub fn mirror_lines(&self, program: &str, duration: &str) -> Vec<String> {
        let path = self
            .mirror_dir
            .join(self.pool(program, duration).mirror_file_name());
        std::fs::read_to_string(path)
            .map(|s| s.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    pub async fn unclaimed(&self, program: &str, duration: &str) -> i64 {
        self.key_repo
            .count_unclaimed(&self.pool(program, duration))
            .await
            .unwrap()
    }
}
