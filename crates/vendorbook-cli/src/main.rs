//! Vendorbook - command-line front end for the vendor marketplace client.
//!
//! Each subcommand plays the part of one app screen: it restores the stored
//! session, runs inside the session provider, and reports which navigation
//! root the session gate selects afterwards.

mod app;
mod prompt;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vendorbook_core::Config;

use app::App;

/// Log file name prefix inside the data directory
const LOG_FILE_PREFIX: &str = "vendorbook.log";

#[derive(Parser)]
#[command(name = "vendorbook", version, about = "Vendor marketplace client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Register a new vendor account
    Signup,
    /// Sign out and forget the stored session
    Logout,
    /// Show the current session and active navigation root
    Status,
    /// Show the signed-in user's profile
    Profile,
    /// List all vendor profiles
    Profiles,
    /// Edit the signed-in user's profile
    UpdateProfile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// List menu items
    Menus {
        #[arg(long)]
        vendor: Option<String>,
    },
    /// Add a menu item
    MenuAdd {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        image: Option<String>,
    },
    /// Show or hide a menu item
    MenuToggle { id: String },
    /// Delete a menu item
    MenuDelete { id: String },
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr and, when the data directory is available, to a daily
/// rolling file. The returned guard must live until exit to flush the file.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.data_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load()?;

    let _log_guard = init_tracing(&config);
    info!("Vendorbook starting");

    let app = App::new(config)?;
    let result = app.run(cli.command).await;

    if let Err(ref e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Vendorbook shutting down");
    result
}
