//! # Stash CLI Module
//!
//! This module implements the CLI interface for Stash.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database
//! - `status` - Show record counts
//! - `add-asset` / `list-assets [--disposal]` / `show-asset` / `delete-asset` - Inventory
//! - `assign` / `list-assignments` - Assignments
//! - `log-maintenance` / `list-maintenance [--from --to]` / `delete-maintenance` - Maintenance log
//! - `counters` - Show asset-number sequence counters
//! - `compact` - Compact the redb database file

mod commands;

use crate::config::{BackendKind, StashConfig};
use clap::{Args, Parser, Subcommand};
use stash_core::StashError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Stash - asset inventory server
///
/// Keeps inventory, assignment and maintenance records and issues their
/// asset numbers and maintenance references.
#[derive(Parser, Debug)]
#[command(name = "stash")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: ./stash.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database, overriding the configuration
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (ACID database) or "memory"
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Descriptive fields of an inventory record.
#[derive(Args, Debug, Clone, Default)]
pub struct AssetArgs {
    /// Manufacturer
    #[arg(long, default_value = "")]
    pub brand: String,

    /// Model name
    #[arg(long, default_value = "")]
    pub model: String,

    /// Serial number (unique across the inventory)
    #[arg(short, long)]
    pub serial: String,

    /// Kind of device (laptop, monitor, ...)
    #[arg(long = "type", default_value = "")]
    pub asset_type: String,

    #[arg(long, default_value = "")]
    pub processor: String,

    #[arg(long, default_value = "")]
    pub ram: String,

    #[arg(long, default_value = "")]
    pub storage: String,

    /// Purchase date (YYYY-MM-DD)
    #[arg(long)]
    pub purchase_date: Option<String>,

    /// Purchase amount in minor currency units
    #[arg(long)]
    pub amount_cents: Option<u64>,

    #[arg(long, default_value = "")]
    pub remarks: String,

    /// Recorded creator
    #[arg(long, default_value = "")]
    pub created_by: String,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides configuration)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show record counts
    Status,

    /// Add an inventory record and allocate its asset number
    AddAsset {
        #[command(flatten)]
        asset: AssetArgs,
    },

    /// List inventory records
    ListAssets {
        /// Only assets older than five years
        #[arg(long)]
        disposal: bool,
    },

    /// Show one inventory record
    ShowAsset {
        /// Asset number
        asset_number: String,
    },

    /// Delete an inventory record with no maintenance or assignment history
    DeleteAsset {
        /// Asset number
        asset_number: String,
    },

    /// Add an asset and assign it to an employee
    Assign {
        #[command(flatten)]
        asset: AssetArgs,

        /// Employee reference
        #[arg(long, default_value = "")]
        reference_id: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        #[arg(long, default_value = "")]
        position: String,

        #[arg(long, default_value = "")]
        department: String,

        #[arg(long, default_value = "")]
        location: String,

        /// Assignment status (default: Active)
        #[arg(long, default_value = "")]
        status: String,
    },

    /// List assignments
    ListAssignments,

    /// Log a maintenance event and allocate its reference
    LogMaintenance {
        /// Asset number the event applies to
        #[arg(short, long)]
        asset_number: String,

        /// Maintenance date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Originally scheduled date (YYYY-MM-DD)
        #[arg(long)]
        scheduled: Option<String>,

        #[arg(long, default_value = "")]
        performed_by: String,

        #[arg(long, default_value = "")]
        remarks: String,

        #[arg(long, default_value = "")]
        status: String,
    },

    /// List maintenance entries with their inventory records
    ListMaintenance {
        /// Only entries for this asset number
        #[arg(short, long)]
        asset_number: Option<String>,

        /// Earliest maintenance date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest maintenance date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Delete a maintenance entry
    DeleteMaintenance {
        /// Maintenance reference
        reference: String,
    },

    /// Show asset-number sequence counters
    Counters,

    /// Compact the redb database file
    Compact,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve the configuration: file, then environment, then command-line flags.
pub fn resolve_config(cli: &Cli) -> Result<StashConfig, StashError> {
    let mut config = StashConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.database {
        config.storage.path = path.clone();
    }
    if let Some(backend) = &cli.backend {
        config.storage.backend = backend.parse::<BackendKind>()?;
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), StashError> {
    let mut config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Status) | None => cmd_status(&config, json_mode),
        Some(Commands::AddAsset { asset }) => cmd_add_asset(&config, json_mode, &asset),
        Some(Commands::ListAssets { disposal }) => cmd_list_assets(&config, json_mode, disposal),
        Some(Commands::ShowAsset { asset_number }) => {
            cmd_show_asset(&config, json_mode, &asset_number)
        }
        Some(Commands::DeleteAsset { asset_number }) => {
            cmd_delete_asset(&config, json_mode, &asset_number)
        }
        Some(Commands::Assign {
            asset,
            reference_id,
            first_name,
            last_name,
            position,
            department,
            location,
            status,
        }) => {
            let employee = EmployeeArgs {
                reference_id,
                first_name,
                last_name,
                position,
                department,
                location,
                status,
            };
            cmd_assign(&config, json_mode, &asset, employee)
        }
        Some(Commands::ListAssignments) => cmd_list_assignments(&config, json_mode),
        Some(Commands::LogMaintenance {
            asset_number,
            date,
            scheduled,
            performed_by,
            remarks,
            status,
        }) => {
            let event = MaintenanceArgs {
                asset_number,
                date,
                scheduled,
                performed_by,
                remarks,
                status,
            };
            cmd_log_maintenance(&config, json_mode, event)
        }
        Some(Commands::ListMaintenance {
            asset_number,
            from,
            to,
        }) => {
            let filter =
                maintenance_filter(asset_number.as_deref(), from.as_deref(), to.as_deref())?;
            cmd_list_maintenance(&config, json_mode, &filter)
        }
        Some(Commands::DeleteMaintenance { reference }) => {
            cmd_delete_maintenance(&config, json_mode, &reference)
        }
        Some(Commands::Counters) => cmd_counters(&config, json_mode),
        Some(Commands::Compact) => cmd_compact(&config),
    }
}

// =============================================================================
// TESTS
// =============================================================================
