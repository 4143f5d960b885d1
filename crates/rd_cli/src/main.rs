use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use rd_core::{Error, Result};
use rd_scrapers::{EnhanceConfig, EnhanceManager, ImportConfig, ListingImporter};
use rd_web::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, default_value = "sqlite")]
    storage: String,
    #[arg(long, default_value = "articles.db")]
    db_path: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Import the oldest articles from a blog listing
    Import {
        #[arg(long, default_value_t = 7)]
        count: usize,
        /// Listing URL; falls back to REDRAFT_LISTING_URL
        #[arg(long)]
        url: Option<String>,
        /// Clear the store before importing
        #[arg(long)]
        reset: bool,
    },
    /// Enhance pending articles using formatting from web references
    Enhance {
        /// Maximum number of articles to process
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Serve the article CRUD API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    info!("💾 connecting storage backend ({})", cli.storage);
    let store = rd_storage::create_store(&cli.storage, Some(&cli.db_path)).await?;

    match cli.command {
        Commands::Import { count, url, reset } => {
            let listing_url = url
                .or_else(|| std::env::var("REDRAFT_LISTING_URL").ok())
                .ok_or_else(|| {
                    Error::Validation(
                        "listing url required: pass --url or set REDRAFT_LISTING_URL".to_string(),
                    )
                })?;
            let mut config = ImportConfig::new(listing_url);
            config.count = count;
            config.reset = reset;

            let importer = ListingImporter::new(store.clone(), config.fetch_timeout);
            let summary = importer.run(&config).await?;
            info!(
                "🎯 import finished: saved={} skipped={}",
                summary.saved, summary.skipped
            );
        }
        Commands::Enhance { limit } => {
            let manager = EnhanceManager::new(store.clone(), EnhanceConfig::default());
            let summary = manager.run(limit).await?;
            info!(
                "🎯 enhancement finished: {}/{} enhanced, {} without references, {} thin, {} failed",
                summary.enhanced,
                summary.total,
                summary.skipped_no_references,
                summary.skipped_thin,
                summary.failed
            );
        }
        Commands::Serve { addr } => {
            let app = rd_web::create_app(AppState {
                store: store.clone(),
            });
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("🌐 serving article API on {}", addr);
            axum::serve(listener, app)
                .await
                .map_err(Error::Io)?;
        }
    }

    Ok(())
}
