use clap::{Parser, Subcommand};
use news_aggregator::{needs_refresh, AppConfig, NewsPipeline, NewsStore};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "news-aggregator", about = "Topic news ingestion pipeline")]
struct Cli {
    /// SQLite database path (overrides NEWS_DB_PATH).
    #[arg(long)]
    db: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one ingestion pass over the configured topics (default).
    Run {
        /// Lookback window in days.
        #[arg(long, default_value_t = 3)]
        days: i64,

        /// Maximum feed entries processed per topic.
        #[arg(long, default_value_t = 20)]
        max_items: usize,

        /// Ingest even when a pass already ran today.
        #[arg(long)]
        force: bool,
    },
    /// Full-text search over stored articles.
    Search {
        query: String,

        /// Restrict to one topic key.
        #[arg(long)]
        topic: Option<String>,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Import a legacy JSON snapshot into an empty store.
    Import { path: PathBuf },
    /// Show store statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = AppConfig::default();
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    match cli.command.unwrap_or(Command::Run {
        days: 3,
        max_items: 20,
        force: false,
    }) {
        Command::Run {
            days,
            max_items,
            force,
        } => {
            config.lookback_days = days;
            config.max_items = max_items;

            let pipeline = NewsPipeline::new(config).await?;

            if !force && !needs_refresh(pipeline.store()).await? {
                info!("already ingested today; use --force to run anyway");
                return Ok(());
            }

            let report = pipeline.run().await?;
            info!(
                fetched = report.fetched,
                inserted = report.inserted,
                "run finished"
            );
            for topic in &report.reduced_freshness {
                warn!(topic = %topic, "results come from the widened fallback window");
            }
            for topic in &report.failed_topics {
                warn!(topic = %topic, "topic failed this run");
            }
        }
        Command::Search {
            query,
            topic,
            limit,
        } => {
            let store = NewsStore::open(&config.db_path).await?;
            let items = store.search(&query, topic.as_deref(), limit).await?;
            for item in items {
                println!("[{}] {} ({})", item.topic, item.title, item.link);
            }
        }
        Command::Import { path } => {
            let store = NewsStore::open(&config.db_path).await?;
            let imported = store.import_legacy_snapshot(&path).await?;
            info!(imported, "legacy import finished");
        }
        Command::Stats => {
            let store = NewsStore::open(&config.db_path).await?;
            let count = store.count_items().await?;
            let last_updated = store.get_meta("last_updated").await?;
            println!("items: {}", count);
            println!("last updated: {}", last_updated.as_deref().unwrap_or("never"));
        }
    }

    Ok(())
}
