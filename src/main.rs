//! jadwal - an offline-first class schedule manager.
//!
//! Schedule entries live in one local JSON blob (compatible with the
//! original web app's localStorage layout); CSV export/import uses the same
//! interchange format; and an offline shell asset cache keeps the app shell
//! available without network under version-tagged generations.

mod cache;
mod config;
mod csv;
mod models;
mod net;
mod store;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cache::{AssetCache, AssetRequest, FetchOutcome};
use config::Config;
use models::{RecordDraft, Weekday};
use net::HttpFetcher;
use store::{LoadStatus, RecordFilter, RecordStore};

#[derive(Parser)]
#[command(name = "jadwal")]
#[command(about = "Manage a local class schedule, with an offline shell asset cache")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a schedule entry
    Add {
        /// Course name
        course: String,

        /// Day of week
        #[arg(short, long)]
        day: Weekday,

        /// Time range (e.g. "08:00 - 10:00")
        #[arg(short, long)]
        time: String,

        /// Room identifier
        #[arg(short, long)]
        room: String,
    },
    /// List schedule entries, optionally filtered
    List {
        /// Only entries on this day
        #[arg(short, long)]
        day: Option<Weekday>,

        /// Only entries whose room contains this text
        #[arg(short, long)]
        room: Option<String>,

        /// Free-text search across all fields
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Delete the schedule entry (or entries) with the given id
    Remove {
        id: i64,
    },
    /// Export the schedule as CSV
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only entries on this day
        #[arg(short, long)]
        day: Option<Weekday>,

        /// Only entries whose room contains this text
        #[arg(short, long)]
        room: Option<String>,

        /// Free-text search across all fields
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Import schedule entries from a CSV file
    Import {
        file: PathBuf,
    },
    /// Write a sample CSV file
    Sample {
        #[arg(short, long, default_value = "sample-jadwal.csv")]
        output: PathBuf,
    },
    /// Show or set the origin shell assets are fetched from
    Origin {
        value: Option<String>,
    },
    /// Manage the offline shell asset cache
    Offline {
        #[command(subcommand)]
        command: OfflineCommands,
    },
}

#[derive(Subcommand)]
enum OfflineCommands {
    /// Fetch and cache every shell asset (all-or-nothing)
    Install,
    /// Delete cache generations with a stale version tag
    Activate,
    /// Show the current generation, entry count, and stale generations
    Status,
    /// Fetch a URL through the cache (cache-first)
    Get {
        url: String,

        /// Treat as a page navigation (fall back to the cached shell
        /// document on network failure)
        #[arg(long)]
        navigate: bool,
    },
}

/// Initialize the tracing subscriber for logging.
/// Use the RUST_LOG env var to control the level (e.g. RUST_LOG=debug).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Add {
            course,
            day,
            time,
            room,
        } => cmd_add(&config, course, day, time, room),
        Commands::List { day, room, search } => cmd_list(&config, day, room, search),
        Commands::Remove { id } => cmd_remove(&config, id),
        Commands::Export {
            output,
            day,
            room,
            search,
        } => cmd_export(&config, output, day, room, search),
        Commands::Import { file } => cmd_import(&config, &file),
        Commands::Sample { output } => cmd_sample(&output),
        Commands::Origin { value } => cmd_origin(config, value),
        Commands::Offline { command } => cmd_offline(&config, command).await,
    }
}

/// Open the record store, surfacing corrupt-blob recovery to the user.
fn open_store(config: &Config) -> Result<RecordStore> {
    let store = RecordStore::open(config.store_path()?);
    if store.load_status() == LoadStatus::Corrupt {
        eprintln!("Warning: existing schedule data could not be read; starting from an empty collection.");
    }
    Ok(store)
}

fn filter_of(day: Option<Weekday>, room: Option<String>, search: Option<String>) -> RecordFilter {
    RecordFilter {
        day: day.map(|d| d.to_string()),
        room,
        query: search,
    }
}

fn cmd_add(config: &Config, course: String, day: Weekday, time: String, room: String) -> Result<()> {
    let mut store = open_store(config)?;
    let id = store.add(RecordDraft::new(course, day.to_string(), time, room))?;
    println!("Added schedule {} ({} total)", id, store.len());
    Ok(())
}

fn cmd_list(
    config: &Config,
    day: Option<Weekday>,
    room: Option<String>,
    search: Option<String>,
) -> Result<()> {
    let store = open_store(config)?;
    if store.is_empty() {
        println!("No schedules yet. Add one with `jadwal add`.");
        return Ok(());
    }

    let matched = store.filter(&filter_of(day, room, search));
    if matched.is_empty() {
        println!("No schedules match the filter.");
        return Ok(());
    }

    println!(
        "{:<16} {:<30} {:<10} {:<18} ROOM",
        "ID", "COURSE", "DAY", "TIME"
    );
    for record in &matched {
        println!(
            "{:<16} {:<30} {:<10} {:<18} {}",
            record.id, record.course_name, record.day, record.time, record.room
        );
    }
    println!("\n{} of {} schedules", matched.len(), store.len());
    Ok(())
}

fn cmd_remove(config: &Config, id: i64) -> Result<()> {
    let mut store = open_store(config)?;
    let removed = store.remove(id)?;
    if removed == 0 {
        println!("No schedule with id {}", id);
    } else {
        println!("Removed {} schedule(s)", removed);
    }
    Ok(())
}

fn cmd_export(
    config: &Config,
    output: Option<PathBuf>,
    day: Option<Weekday>,
    room: Option<String>,
    search: Option<String>,
) -> Result<()> {
    let store = open_store(config)?;
    let matched = store.filter(&filter_of(day, room, search));
    if matched.is_empty() {
        println!("Nothing to export.");
        return Ok(());
    }

    let contents = csv::export(&matched);
    match output {
        Some(path) => {
            std::fs::write(&path, contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported {} schedules to {}", matched.len(), path.display());
        }
        None => println!("{}", contents),
    }
    Ok(())
}

fn cmd_import(config: &Config, file: &PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let drafts = csv::extract_drafts(&text).context("Failed to read CSV")?;

    let mut store = open_store(config)?;
    let accepted = store.import_batch(drafts)?;
    if accepted > 0 {
        println!("Imported {} schedules", accepted);
    } else {
        println!("No valid rows in CSV");
    }
    Ok(())
}

fn cmd_sample(output: &PathBuf) -> Result<()> {
    std::fs::write(output, csv::SAMPLE)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote sample CSV to {}", output.display());
    Ok(())
}

fn cmd_origin(mut config: Config, value: Option<String>) -> Result<()> {
    match value {
        Some(origin) => {
            config.origin = Some(origin);
            config.save()?;
            println!("Origin set to {}", config.origin());
        }
        None => println!("{}", config.origin()),
    }
    Ok(())
}

async fn cmd_offline(config: &Config, command: OfflineCommands) -> Result<()> {
    let fetcher = HttpFetcher::new()?;
    let cache = AssetCache::new(config.cache_root()?, config.origin(), fetcher);

    match command {
        OfflineCommands::Install => {
            let cached = cache.install().await?;
            println!(
                "Cached {} shell assets under generation {}",
                cached,
                cache.generation()
            );
        }
        OfflineCommands::Activate => {
            let deleted = cache.activate()?;
            if deleted.is_empty() {
                println!("No stale cache generations.");
            } else {
                for name in deleted {
                    println!("Deleted stale generation {}", name);
                }
            }
        }
        OfflineCommands::Status => {
            let status = cache.status()?;
            println!("Generation: {}", status.generation);
            println!("Entries:    {}", status.entries);
            if !status.stale.is_empty() {
                println!("Stale:      {}", status.stale.join(", "));
            }
        }
        OfflineCommands::Get { url, navigate } => {
            let request = if navigate {
                AssetRequest::navigation(url)
            } else {
                AssetRequest::get(url)
            };
            match cache.fetch(&request).await? {
                FetchOutcome::Cached(asset) => {
                    println!("cache hit: {} bytes, status {}", asset.body.len(), asset.status)
                }
                FetchOutcome::Network(asset) => {
                    println!("network: {} bytes, status {}", asset.body.len(), asset.status)
                }
                FetchOutcome::Fallback(asset) => println!(
                    "network failed, served cached shell document ({} bytes)",
                    asset.body.len()
                ),
                FetchOutcome::Passthrough(asset) => {
                    println!("passed through to network, status {}", asset.status)
                }
                FetchOutcome::Ignored => println!("request ignored (unsupported scheme)"),
            }
        }
    }
    Ok(())
}
