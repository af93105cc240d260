//! # GoMarketplace CLI Library
//!
//! Argument parsing, startup wiring and command dispatch for the `gomarket`
//! binary.
//!
//! ## Module Organization
//! ```text
//! gomarket_cli/
//! ├── lib.rs          ◄─── You are here (startup & dispatch)
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   └── cart.rs     ◄─── Cart commands
//! └── error.rs        ◄─── CLI error type and exit codes
//! ```

pub mod commands;
pub mod error;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gomarket_cart::{CartConfig, CartContext, CartStore};
use gomarket_db::{Database, DbConfig};

use commands::cart::{self, AddLine, CartResponse};
use error::CliError;

/// File name of the database inside the platform data directory.
pub const DATABASE_FILE_NAME: &str = "gomarket.db";

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "gomarket")]
#[command(version, about = "GoMarketplace shopping cart", long_about = None)]
pub struct Cli {
    /// Config file path (default: platform config dir / cart.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path (overrides GOMARKET_DB_PATH and the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the cart
    List,

    /// Add one unit of a product
    Add {
        /// Product id
        #[arg(long)]
        id: String,

        /// Product title
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long, default_value = "")]
        image_url: String,

        /// Unit price
        #[arg(long)]
        price: f64,
    },

    /// Raise a line's quantity by one
    Increment {
        /// Product id
        id: String,
    },

    /// Lower a line's quantity by one (never below 1)
    Decrement {
        /// Product id
        id: String,
    },

    /// Write the default config file
    InitConfig,
}

// =============================================================================
// Startup
// =============================================================================

/// Runs one command and returns the text to print on stdout.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                         CLI Startup                                     │
/// │                                                                         │
/// │  1. Load CartConfig ──── defaults → cart.toml → GOMARKET_* env         │
/// │  2. Resolve DB path ──── --db → GOMARKET_DB_PATH → config → data dir   │
/// │  3. Open database ────── SQLite, WAL, migrations                       │
/// │  4. CartStore::open ──── restore the saved cart                        │
/// │  5. Run command ──────── through CartContext                           │
/// │  6. close() ──────────── the write is durable before the process ends │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(cli: Cli) -> Result<String, CliError> {
    if matches!(cli.command, Command::InitConfig) {
        return init_config(cli.config);
    }

    let config = CartConfig::load(cli.config.clone())?;
    let db_path = resolve_database_path(cli.db.clone(), &config)?;
    info!(?db_path, key = %config.storage_key(), "Opening cart");

    let db = Database::new(DbConfig::new(db_path)).await?;
    let store = CartStore::open(Arc::new(db.key_values()), &config).await;
    let ctx = CartContext::provide(store.clone());

    let result = dispatch(&ctx, cli.command);

    let closed = store.close().await;
    db.close().await;

    let response = result?;
    closed?;
    render(&response, cli.json)
}

fn dispatch(ctx: &CartContext, command: Command) -> Result<CartResponse, CliError> {
    match command {
        Command::List => cart::list(ctx),
        Command::Add {
            id,
            title,
            image_url,
            price,
        } => cart::add(
            ctx,
            AddLine {
                id,
                title,
                image_url,
                price,
            },
        ),
        Command::Increment { id } => cart::increment(ctx, &id),
        Command::Decrement { id } => cart::decrement(ctx, &id),
        Command::InitConfig => Err(CliError::internal("init-config does not use the cart")),
    }
}

fn render(response: &CartResponse, json: bool) -> Result<String, CliError> {
    if json {
        Ok(serde_json::to_string_pretty(response)?)
    } else {
        Ok(response.render_table())
    }
}

fn init_config(path: Option<PathBuf>) -> Result<String, CliError> {
    let written = CartConfig::default().save(path)?;
    Ok(format!("Wrote {}\n", written.display()))
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout stays clean for `--json`.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=gomarket=trace` - Show trace for gomarket crates only
/// - Default: `info,gomarket=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gomarket=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines the database file path.
///
/// ## Resolution Order
/// 1. `--db`
/// 2. `GOMARKET_DB_PATH` (already folded into `config` by `CartConfig::load`)
/// 3. `[storage] database_path` in the config file
/// 4. Platform data directory:
///    - **macOS**: `~/Library/Application Support/com.gomarket.gomarketplace/gomarket.db`
///    - **Windows**: `%APPDATA%\gomarket\gomarketplace\data\gomarket.db`
///    - **Linux**: `~/.local/share/gomarketplace/gomarket.db`
pub fn resolve_database_path(
    flag: Option<PathBuf>,
    config: &CartConfig,
) -> Result<PathBuf, CliError> {
    if let Some(path) = flag.or_else(|| config.storage.database_path.clone()) {
        return Ok(path);
    }

    let proj_dirs = ProjectDirs::from("com", "gomarket", "gomarketplace")
        .ok_or_else(|| CliError::internal("Could not determine app data directory"))?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir).map_err(|e| {
        warn!(?data_dir, error = %e, "Failed to create data directory");
        CliError::internal(format!("Failed to create {}: {}", data_dir.display(), e))
    })?;

    Ok(data_dir.join(DATABASE_FILE_NAME))
}
