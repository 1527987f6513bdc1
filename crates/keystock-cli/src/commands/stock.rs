//! Stock management CLI commands.

use std::path::Path;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use keystock_core::error::{AppError, ErrorKind};
use keystock_service::{Allocation, RequestContext, StockLevel};

use super::{Services, parse_principal};
use crate::output::{self, OutputFormat};

/// Arguments for stock commands
#[derive(Debug, Args)]
pub struct StockArgs {
    /// Stock subcommand
    #[command(subcommand)]
    pub command: StockCommand,
}

/// Stock subcommands
#[derive(Debug, Subcommand)]
pub enum StockCommand {
    /// Import keys from a .txt file
    Import {
        /// Program
        program: String,
        /// Duration
        duration: String,
        /// Text file with keys separated by newlines, commas, semicolons,
        /// tabs, or spaces
        #[arg(long)]
        file: String,
    },
    /// Count unclaimed keys
    Count {
        /// Program
        program: String,
        /// Duration
        duration: String,
    },
    /// Delete every unclaimed key of a pool
    Clear {
        /// Program
        program: String,
        /// Duration
        duration: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Allocate one key to a recipient
    Allocate {
        /// Program
        program: String,
        /// Duration
        duration: String,
        /// Principal receiving the key
        #[arg(long)]
        recipient: i64,
    },
    /// Show store counters and mirror drift of a pool
    Status {
        /// Program
        program: String,
        /// Duration
        duration: String,
    },
    /// Regenerate a pool's mirror file from the database
    RebuildMirror {
        /// Program
        program: String,
        /// Duration
        duration: String,
    },
    /// Show counters for every pool
    Overview,
}

/// One overview row.
#[derive(Debug, Serialize, Tabled)]
struct StockRow {
    #[tabled(rename = "Program")]
    program: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Unclaimed")]
    unclaimed: i64,
    #[tabled(rename = "Claimed")]
    claimed: i64,
    #[tabled(rename = "Last Claim")]
    last_claimed_at: String,
}

impl From<StockLevel> for StockRow {
    fn from(level: StockLevel) -> Self {
        Self {
            program: level.program,
            duration: level.duration,
            unclaimed: level.unclaimed,
            claimed: level.claimed,
            last_claimed_at: level
                .last_claimed_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Execute stock commands
pub async fn execute(
    args: &StockArgs,
    services: &Services,
    ctx: &RequestContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        StockCommand::Import {
            program,
            duration,
            file,
        } => {
            let text = read_import_file(Path::new(file)).await?;
            let summary = services
                .import
                .import_text(ctx, program, duration, &text)
                .await?;
            output::print_record(
                "Import",
                &summary,
                &[
                    ("Added", summary.added.to_string()),
                    ("Duplicates", summary.duplicates.to_string()),
                ],
                format,
            );
        }
        StockCommand::Count { program, duration } => {
            let unclaimed = services
                .report
                .count_unclaimed(ctx, program, duration)
                .await?;
            output::print_record(
                "Stock",
                &serde_json::json!({ "program": program, "duration": duration, "unclaimed": unclaimed }),
                &[("Unclaimed", unclaimed.to_string())],
                format,
            );
        }
        StockCommand::Clear {
            program,
            duration,
            force,
        } => {
            let pool = services.config.inventory.pool(program, duration)?;
            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Delete every unclaimed key in {pool}? Claimed keys are kept."
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let summary = services.report.clear_pool(ctx, program, duration).await?;
            output::print_record(
                "Cleared",
                &summary,
                &[("Removed", summary.removed.to_string())],
                format,
            );
        }
        StockCommand::Allocate {
            program,
            duration,
            recipient,
        } => {
            let recipient = parse_principal(*recipient)?;
            match services
                .allocation
                .allocate(ctx, program, duration, recipient)
                .await?
            {
                Allocation::Allocated(key) => output::print_record(
                    "Allocated",
                    &key,
                    &[
                        ("Key", key.value.clone()),
                        ("Key ID", key.id.to_string()),
                        ("Recipient", key.claimed_for.to_string()),
                        ("Claimed At", key.claimed_at.to_rfc3339()),
                    ],
                    format,
                ),
                Allocation::NoStock => {
                    let pool = services.config.inventory.pool(program, duration)?;
                    output::print_warning(&format!("No keys left in {pool}"));
                }
            }
        }
        StockCommand::Status { program, duration } => {
            let status = services.report.pool_status(ctx, program, duration).await?;
            output::print_record(
                "Pool Status",
                &status,
                &[
                    ("Unclaimed", status.unclaimed.to_string()),
                    ("Claimed", status.claimed.to_string()),
                    ("Usage", format!("{:.1}%", status.usage_percent())),
                    (
                        "Last Claim",
                        status
                            .last_claimed_at
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    ("Mirror Lines", status.mirror_lines.to_string()),
                    ("Missing From Mirror", status.missing_from_mirror.to_string()),
                    ("Stale In Mirror", status.stale_in_mirror.to_string()),
                    ("Drift Detected", status.drift_detected.to_string()),
                ],
                format,
            );
            if status.drift_detected && format == OutputFormat::Table {
                output::print_warning("Mirror drift detected; run `stock rebuild-mirror` to repair");
            }
        }
        StockCommand::RebuildMirror { program, duration } => {
            let summary = services.report.rebuild_mirror(ctx, program, duration).await?;
            output::print_record(
                "Mirror Rebuilt",
                &summary,
                &[
                    ("Lines Written", summary.lines_written.to_string()),
                    ("Drift Corrected", summary.drift_corrected.to_string()),
                ],
                format,
            );
        }
        StockCommand::Overview => {
            let rows: Vec<StockRow> = services
                .report
                .stock_overview(ctx)
                .await?
                .into_iter()
                .map(StockRow::from)
                .collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}

/// Read an import file. Only `.txt` files are accepted; contents are
/// decoded as UTF-8 with invalid sequences replaced.
async fn read_import_file(path: &Path) -> Result<String, AppError> {
    let is_txt = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
    if !is_txt {
        return Err(AppError::validation(format!(
            "Import file must be a .txt file: {}",
            path.display()
        )));
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to read import file: {}", path.display()),
            e,
        )
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
