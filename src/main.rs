use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::error;

use sxodim_scraper::config::Config;
use sxodim_scraper::fetch::HttpFetcher;
use sxodim_scraper::logging;
use sxodim_scraper::pipeline::{FetchOptions, Pipeline};
use sxodim_scraper::store::EventStore;

#[derive(Parser)]
#[command(name = "sxodim_scraper")]
#[command(about = "sxodim.com event scraper for the Almaty tourism backend")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape listings and detail pages, upsert events and translations
    Fetch {
        /// Maximum number of events to fetch (0 = no limit)
        #[arg(long, default_value_t = 0)]
        limit: usize,
        /// Preview what would be fetched without saving to the database
        #[arg(long)]
        dry_run: bool,
        /// Delay between HTTP requests in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Override the database path from the config
        #[arg(long)]
        db: Option<String>,
    },
    /// Print stored events
    Show {
        /// Maximum number of events to print (0 = no limit)
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Override the database path from the config
        #[arg(long)]
        db: Option<String>,
    },
    /// Delete all scraped events and translations
    ClearDb {
        /// Override the database path from the config
        #[arg(long)]
        db: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Fetch {
            limit,
            dry_run,
            delay_ms,
            db,
        } => {
            println!("🔄 Fetching events from {}...", config.source.base_url);

            let db_path = db.unwrap_or_else(|| config.database.path.clone());
            let delay = Duration::from_millis(delay_ms.unwrap_or(config.source.delay_ms));
            let mut store = EventStore::open(&db_path)?;
            let fetcher = HttpFetcher::new(&config.source)?;
            let pipeline = Pipeline::new(Box::new(fetcher), config)?;

            let options = FetchOptions {
                limit,
                dry_run,
                delay,
            };
            match pipeline.run(&mut store, &options).await {
                Ok(summary) => {
                    if dry_run {
                        println!(
                            "\n[DRY RUN] Would process {} events ({} errors)",
                            summary.links_found, summary.errors
                        );
                    } else {
                        println!(
                            "\n✅ Done! Created: {}, Updated: {}, Errors: {}",
                            summary.created, summary.updated, summary.errors
                        );
                    }
                    if summary.errors > 0 {
                        println!("⚠️  {} pages could not be processed", summary.errors);
                    }
                }
                Err(e) => {
                    error!(error = %e, "Fetch run failed");
                    println!("❌ Fetch run failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Show { limit, json, db } => {
            let db_path = db.unwrap_or_else(|| config.database.path.clone());
            let store = EventStore::open(&db_path)?;
            let events = store.list_events(limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                println!("📋 {} event(s):", events.len());
                for event in events {
                    println!(
                        "  #{:<5} {} {:>7} {} | {} | {}",
                        event.id, event.date, event.cost, event.currency, event.artist, event.link
                    );
                }
            }
        }
        Commands::ClearDb { db } => {
            let db_path = db.unwrap_or_else(|| config.database.path.clone());
            let store = EventStore::open(&db_path)?;
            store.clear_all()?;
            println!("🗑️  Cleared all events from {}", db_path);
        }
    }
    Ok(())
}
