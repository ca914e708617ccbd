mod commands;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use daybook_core::config::DaybookConfig;
use daybook_core::store::JsonStore;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "A personal calendar that imports and exports .ics files")]
struct Cli {
    /// Log what daybook is doing (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import every event from an .ics file
    Import { file: PathBuf },
    /// Export all events to an .ics file
    Export {
        /// Where to write (defaults to the temp dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show upcoming events, recurring ones expanded
    Agenda {
        /// How many days ahead to show (defaults to horizon_days)
        #[arg(short, long)]
        days: Option<i64>,

        /// Include occurrences that already ended
        #[arg(long)]
        all: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Create an event
    Add(commands::add::AddArgs),
    /// Change an event by id
    Edit(commands::edit::EditArgs),
    /// Delete an event by id
    Delete { id: i64 },
    /// Find events by title or description
    Search { query: String },
    /// Show events with a reminder starting soon
    Reminders {
        /// Look this many minutes ahead (defaults to reminder_window_minutes)
        #[arg(short, long)]
        within: Option<i64>,
    },
    /// Show config and data paths
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = DaybookConfig::load().context("Could not load config")?;

    match cli.command {
        Commands::Import { file } => {
            let mut store = open_store(&config)?;
            commands::import::run(&mut store, &file).await
        }
        Commands::Export { output } => {
            let store = open_store(&config)?;
            commands::export::run(&store, &config, output).await
        }
        Commands::Agenda { days, all, json } => {
            let store = open_store(&config)?;
            let days = days.unwrap_or(config.horizon_days);
            commands::agenda::run(&store, days, all, json)
        }
        Commands::Add(args) => {
            let mut store = open_store(&config)?;
            commands::add::run(&mut store, args)
        }
        Commands::Edit(args) => {
            let mut store = open_store(&config)?;
            commands::edit::run(&mut store, args)
        }
        Commands::Delete { id } => {
            let mut store = open_store(&config)?;
            commands::delete::run(&mut store, id)
        }
        Commands::Search { query } => {
            let store = open_store(&config)?;
            commands::search::run(&store, &query)
        }
        Commands::Reminders { within } => {
            let store = open_store(&config)?;
            let within = within.unwrap_or(config.reminder_window_minutes);
            commands::reminders::run(&store, within)
        }
        Commands::Config => commands::config::run(&config),
    }
}

/// Log to stderr; RUST_LOG wins unless --verbose is given.
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")?;

    Ok(())
}

fn open_store(config: &DaybookConfig) -> Result<JsonStore> {
    let path = config.store_path();

    JsonStore::open(&path)
        .with_context(|| format!("Could not open event store at {}", path.display()))
}
