//! Grant management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use keystock_core::error::AppError;
use keystock_entity::grant::Grant;
use keystock_service::RequestContext;

use super::{Services, parse_principal};
use crate::output::{self, OutputFormat};

/// Arguments for grant commands
#[derive(Debug, Args)]
pub struct GrantArgs {
    /// Grant subcommand
    #[command(subcommand)]
    pub command: GrantCommand,
}

/// Grant subcommands
#[derive(Debug, Subcommand)]
pub enum GrantCommand {
    /// Allow a principal to operate on a program
    Add {
        /// Principal id
        principal: i64,
        /// Program
        program: String,
    },
    /// Remove a principal's access to a program
    Remove {
        /// Principal id
        principal: i64,
        /// Program
        program: String,
    },
    /// List stored grants
    List {
        /// Only grants of this principal
        #[arg(long = "of")]
        of: Option<i64>,
    },
    /// Show a principal's access to every program
    Check {
        /// Principal id
        principal: i64,
    },
}

/// One grant row.
#[derive(Debug, Serialize, Tabled)]
struct GrantRow {
    #[tabled(rename = "Principal")]
    principal: i64,
    #[tabled(rename = "Program")]
    program: String,
    #[tabled(rename = "Granted By")]
    granted_by: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

impl From<Grant> for GrantRow {
    fn from(grant: Grant) -> Self {
        Self {
            principal: grant.principal_id.get(),
            program: grant.program,
            granted_by: grant
                .granted_by
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            created_at: grant.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Execute grant commands
pub async fn execute(
    args: &GrantArgs,
    services: &Services,
    ctx: &RequestContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        GrantCommand::Add { principal, program } => {
            let principal = parse_principal(*principal)?;
            let created = services.access.grant(ctx, principal, program).await?;
            if created {
                output::print_success(&format!("Granted {program} to {principal}"));
            } else {
                output::print_warning(&format!("{principal} already holds {program}"));
            }
        }
        GrantCommand::Remove { principal, program } => {
            let principal = parse_principal(*principal)?;
            let outcome = services.access.revoke(ctx, principal, program).await?;
            output::print_record(
                "Revoke",
                &outcome,
                &[
                    ("Removed", outcome.removed.to_string()),
                    (
                        "Still Has Any Access",
                        outcome.still_has_any_access.to_string(),
                    ),
                ],
                format,
            );
        }
        GrantCommand::List { of } => {
            let filter = of.map(parse_principal).transpose()?;
            let rows: Vec<GrantRow> = services
                .access
                .list_grants(ctx, filter)
                .await?
                .into_iter()
                .map(GrantRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        GrantCommand::Check { principal } => {
            let principal = parse_principal(*principal)?;
            let summary = services.access.summary(ctx, principal).await?;

            let mut fields = vec![
                ("Owner", summary.is_owner.to_string()),
                ("Any Access", summary.has_any_access.to_string()),
            ];
            for (program, allowed) in &summary.programs {
                fields.push((program.as_str(), allowed.to_string()));
            }
            output::print_record(
                &format!("Access of {principal}"),
                &summary,
                &fields,
                format,
            );
        }
    }

    Ok(())
}
