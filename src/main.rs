use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

use wildfire::config::Config;
use wildfire::db::{Database, SqliteDatabase};
use wildfire::source::HttpContentSource;

/// Wildfire: trend and engagement analytics for monitored social accounts.
///
/// Collects recent posts from tracked accounts, scores their engagement,
/// and surfaces trending content and topics.
#[derive(Parser)]
#[command(name = "wildfire", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Start tracking an account
    Track {
        /// The platform username (without the @)
        username: String,
    },

    /// Collect recent posts for tracked accounts
    Collect {
        /// Collect a single account instead of all active ones
        #[arg(long)]
        account: Option<String>,
    },

    /// Rescore trends and print the report
    Analyze {
        /// Sliding window in hours (default from COLLECTION_WINDOW_HOURS)
        #[arg(long)]
        window_hours: Option<i64>,

        /// Show one account's analytics instead of the global report
        #[arg(long)]
        account: Option<String>,

        /// Lookback in days for --account (default from ANALYTICS_LOOKBACK_DAYS)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Show system status (tracked accounts, DB stats, recent runs)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wildfire=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Wildfire database...");
            let config = Config::load()?;
            let db = init_database(&config)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nWildfire is ready. Next step: set up your .env file");
            println!("  (see .env.example for required variables)");
            println!("\nThen run: cargo run -- track <username>");
        }

        Commands::Track { username } => {
            let config = Config::load()?;
            config.require_source()?;
            let db = open_database(&config)?;
            let username = username.trim_start_matches('@');

            if db.get_account_by_username(username).await?.is_some() {
                println!("@{username} is already tracked.");
                return Ok(());
            }

            let source = HttpContentSource::new(&config.api_url, &config.api_token)?;
            println!("Fetching @{username} and their recent posts...");

            let summary = wildfire::ingest::collect_account(
                db.as_ref(),
                &source,
                username,
                config.max_posts_per_account,
                chrono::Utc::now(),
            )
            .await?;

            println!(
                "{} Now tracking @{username} — {} posts ingested.",
                "✓".green().bold(),
                summary.items_collected(),
            );
        }

        Commands::Collect { account } => {
            let config = Config::load()?;
            config.require_source()?;
            let db = open_database(&config)?;
            let source = HttpContentSource::new(&config.api_url, &config.api_token)?;
            let now = chrono::Utc::now();

            match account {
                Some(username) => {
                    let username = username.trim_start_matches('@');
                    let summary = wildfire::ingest::collect_account(
                        db.as_ref(),
                        &source,
                        username,
                        config.max_posts_per_account,
                        now,
                    )
                    .await?;
                    println!(
                        "{} @{username}: {} new, {} updated, {} skipped",
                        "✓".green().bold(),
                        summary.items_created,
                        summary.items_updated,
                        summary.posts_skipped,
                    );
                }
                None => {
                    let result = wildfire::ingest::collect_all(
                        db.as_ref(),
                        &source,
                        config.max_posts_per_account,
                        now,
                    )
                    .await?;
                    wildfire::output::terminal::display_collection_result(&result);
                }
            }
        }

        Commands::Analyze {
            window_hours,
            account,
            days,
        } => {
            let config = Config::load()?;
            let db = open_database(&config)?;
            let now = chrono::Utc::now();

            match account {
                Some(username) => {
                    let username = username.trim_start_matches('@');
                    let rollup = wildfire::trends::account_analytics(
                        db.as_ref(),
                        username,
                        days.unwrap_or(config.analytics_lookback_days),
                        now,
                    )
                    .await?;
                    wildfire::output::terminal::display_account_analytics(&rollup);
                }
                None => {
                    let report = wildfire::trends::analyze_trends(
                        db.as_ref(),
                        window_hours.unwrap_or(config.collection_window_hours),
                        config.trending_threshold,
                        now,
                    )
                    .await?;
                    wildfire::output::terminal::display_trend_report(&report);
                }
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            let db = match wildfire::db::open(&config.db_path) {
                Ok(conn) => Arc::new(SqliteDatabase::new(conn)) as Arc<dyn Database>,
                Err(_) => {
                    println!("Database: not initialized");
                    println!("\nRun `wildfire init` to set up the database.");
                    return Ok(());
                }
            };
            wildfire::status::show(&db, &config.db_path).await?;
        }
    }

    Ok(())
}

/// Initialize the database (create if needed).
fn init_database(config: &Config) -> Result<Arc<dyn Database>> {
    let conn = wildfire::db::initialize(&config.db_path)?;
    Ok(Arc::new(SqliteDatabase::new(conn)))
}

/// Open an existing database.
fn open_database(config: &Config) -> Result<Arc<dyn Database>> {
    let conn = wildfire::db::open(&config.db_path)?;
    Ok(Arc::new(SqliteDatabase::new(conn)))
}
