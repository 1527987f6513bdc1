//! CLI command definitions and dispatch.

pub mod grant;
pub mod migrate;
pub mod stock;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use keystock_core::config::AppConfig;
use keystock_core::error::AppError;
use keystock_core::traits::MirrorStore;
use keystock_core::types::PrincipalId;
use keystock_database::DatabasePool;
use keystock_database::migration::run_migrations;
use keystock_database::repositories::{GrantRepository, KeyRepository};
use keystock_service::{
    AccessService, AllocationService, ImportService, ReportService, RequestContext,
};
use keystock_storage::LocalMirrorStore;

use crate::output::OutputFormat;

/// KeyStock: license key inventory administration
#[derive(Debug, Parser)]
#[command(name = "keystock", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Configuration environment overlay (`config/<env>.toml`)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Act as this principal instead of the local operator
    #[arg(long, global = true)]
    pub principal: Option<i64>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Stock import, allocation, and reporting
    Stock(stock::StockArgs),
    /// Grant management
    Grant(grant::GrantArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.config, &self.env)?;
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Stock(args) => {
                let services = Services::open(config).await?;
                let ctx = services.context(self.principal)?;
                stock::execute(args, &services, &ctx, self.format).await
            }
            Commands::Grant(args) => {
                let services = Services::open(config).await?;
                let ctx = services.context(self.principal)?;
                grant::execute(args, &services, &ctx, self.format).await
            }
        }
    }
}

/// The service stack the stock and grant commands run against.
#[derive(Debug)]
pub struct Services {
    /// Loaded configuration.
    pub config: AppConfig,
    /// Access checks and grant management.
    pub access: Arc<AccessService>,
    /// Key import.
    pub import: ImportService,
    /// Key allocation.
    pub allocation: AllocationService,
    /// Counts, clearing, and mirror repair.
    pub report: ReportService,
}

impl Services {
    /// Connect to the database, apply pending migrations, and wire the
    /// services.
    pub async fn open(config: AppConfig) -> Result<Self, AppError> {
        let db = DatabasePool::connect(&config.database).await?;
        run_migrations(db.pool()).await?;

        let mirror: Arc<dyn MirrorStore> =
            Arc::new(LocalMirrorStore::new(&config.inventory.mirror_dir).await?);
        let inventory = Arc::new(config.inventory.clone());
        let key_repo = Arc::new(KeyRepository::new(db.pool().clone()));
        let grant_repo = Arc::new(GrantRepository::new(db.pool().clone()));

        let access = Arc::new(AccessService::new(Arc::clone(&inventory), grant_repo));
        let import = ImportService::new(
            Arc::clone(&inventory),
            Arc::clone(&key_repo),
            Arc::clone(&mirror),
            Arc::clone(&access),
        );
        let allocation = AllocationService::new(
            Arc::clone(&inventory),
            Arc::clone(&key_repo),
            Arc::clone(&mirror),
            Arc::clone(&access),
            config.logging.log_full_key,
        );
        let report = ReportService::new(inventory, key_repo, mirror, Arc::clone(&access));

        Ok(Self {
            config,
            access,
            import,
            allocation,
            report,
        })
    }

    /// Request context for the acting principal; the local operator when
    /// none is given.
    pub fn context(&self, principal: Option<i64>) -> Result<RequestContext, AppError> {
        match principal {
            None => Ok(RequestContext::operator()),
            Some(id) => Ok(self.access.context(parse_principal(id)?)),
        }
    }
}

/// Validate a principal id given on the command line.
pub fn parse_principal(id: i64) -> Result<PrincipalId, AppError> {
    if id <= 0 {
        return Err(AppError::validation(format!("Invalid principal id: {id}")));
    }
    Ok(PrincipalId(id))
}
