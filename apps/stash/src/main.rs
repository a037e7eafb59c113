//! # Stash - Asset Inventory Server
//!
//! The main binary for the Stash asset registry.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for inventory, assignment and maintenance records
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                apps/stash (THE BINARY)               │
//! │                                                      │
//! │  ┌─────────────┐   ┌─────────────┐   ┌────────────┐  │
//! │  │    CLI      │   │  HTTP API   │   │   Config   │  │
//! │  │  (clap)     │   │  (axum)     │   │  (toml)    │  │
//! │  └──────┬──────┘   └──────┬──────┘   └─────┬──────┘  │
//! │         └─────────────────┼────────────────┘         │
//! │                           ▼                          │
//! │                   ┌───────────────┐                  │
//! │                   │  stash-core   │                  │
//! │                   │ (allocation)  │                  │
//! │                   └───────────────┘                  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! stash server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! stash add-asset --brand Dell --model "Latitude 5420" --serial SN123
//! stash log-maintenance --asset-number DELL-LATITUDE_5420-SN123-000001 --date 2024-03-05
//! stash counters
//! ```

use clap::Parser;
use stash::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // STASH_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("STASH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "stash=debug,stash_core=debug,tower_http=debug"
    } else {
        "stash=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ███████╗████████╗ █████╗ ███████╗██╗  ██╗
  ██╔════╝╚══██╔══╝██╔══██╗██╔════╝██║  ██║
  ███████╗   ██║   ███████║███████╗███████║
  ╚════██║   ██║   ██╔══██║╚════██║██╔══██║
  ███████║   ██║   ██║  ██║███████║██║  ██║
  ╚══════╝   ╚═╝   ╚═╝  ╚═╝╚══════╝╚═╝  ╚═╝

  Asset Inventory Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
