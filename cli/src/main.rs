mod commands;
mod config;
mod detector;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_catalog, cmd_clear, cmd_entries, cmd_log, cmd_profile_set, cmd_profile_show, cmd_reset,
    cmd_scan, cmd_search, cmd_summary, parse_day,
};
use crate::config::Config;
use crate::detector::SimulatedDetector;
use nutri_core::catalog::FoodCatalog;
use nutri_core::models::DayKey;
use nutri_core::service::NutriService;

#[derive(Parser)]
#[command(
    name = "nutri",
    version,
    about = "Daily nutrition ledger with profile-based calorie and macro goals"
)]
struct Cli {
    /// Treat this date as today (YYYY-MM-DD or today/yesterday/tomorrow).
    /// A date other than the stored day clears the stored log, even for read-only commands
    #[arg(long, global = true)]
    day: Option<String>,
    /// Keep everything in memory; nothing is read from or written to disk
    #[arg(long, global = true)]
    ephemeral: bool,
    /// Show debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up or show your body profile and the goals derived from it
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Log a food from the catalog by name
    Log {
        /// Food name (case-insensitive substring)
        food: String,
        /// Take the first match instead of asking when several foods match
        #[arg(long)]
        first: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Detect a food in an image and log it
    Scan {
        /// Path to the image file
        image: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search the food catalog
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List every food in the catalog
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show today's dashboard: remaining calories, progress, macros, recent foods
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show everything logged today (newest first)
    Entries {
        /// List in the order the foods were logged
        #[arg(long)]
        oldest_first: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear today's log
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the profile and the log, restoring default goals
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Save your profile and recompute daily goals
    Set {
        /// Body weight in kilograms
        #[arg(long)]
        weight: f64,
        /// Height in centimetres
        #[arg(long)]
        height: f64,
        /// Age in years
        #[arg(long)]
        age: i64,
        /// Sex: male or female
        #[arg(long)]
        sex: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the profile and current goals
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_catalog(path: &Path) -> Result<FoodCatalog> {
    if path.exists() {
        return FoodCatalog::from_csv_path(path);
    }
    tracing::debug!(path = %path.display(), "no catalog file, using built-in foods");
    Ok(FoodCatalog::builtin())
}

fn open_service(
    config: &Config,
    catalog: FoodCatalog,
    today: DayKey,
    ephemeral: bool,
) -> Result<NutriService> {
    let svc = if ephemeral {
        NutriService::new_in_memory(catalog, today)
    } else {
        NutriService::new(&config.db_path, catalog, today)
    };
    svc.with_context(|| format!("Failed to open ledger for {today}"))
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let catalog = load_catalog(&config.catalog_path)?;
    let today = parse_day(cli.day.as_deref())?;
    let mut svc = open_service(&config, catalog.clone(), today, cli.ephemeral)?;

    if let Some(rollover) = svc.take_rollover() {
        let (from, to, n) = (rollover.from, rollover.to, rollover.cleared_entries);
        eprintln!("New day ({to}): cleared {n} entries logged on {from}.");
    }

    match cli.command {
        Commands::Profile { command } => match command {
            ProfileCommands::Set {
                weight,
                height,
                age,
                sex,
                json,
            } => cmd_profile_set(&mut svc, weight, height, age, &sex, json),
            ProfileCommands::Show { json } => cmd_profile_show(&svc, json),
        },
        Commands::Log { food, first, json } => cmd_log(&mut svc, today, &food, first, json),
        Commands::Scan { image, json } => {
            let detector = SimulatedDetector::new(catalog);
            cmd_scan(&mut svc, &detector, today, &image, json)
        }
        Commands::Search { query, json } => cmd_search(&svc, &query, json),
        Commands::Catalog { json } => cmd_catalog(&svc, json),
        Commands::Summary { json } => cmd_summary(&mut svc, today, json),
        Commands::Entries { oldest_first, json } => {
            cmd_entries(&mut svc, today, oldest_first, json)
        }
        Commands::Clear { yes, json } => cmd_clear(&mut svc, yes, json),
        Commands::Reset { yes, json } => cmd_reset(&mut svc, today, yes, json),
        Commands::Serve { port, bind } => {
            let detector = Arc::new(SimulatedDetector::new(catalog));
            server::start_server(svc, detector, port, &bind).await
        }
    }
}
