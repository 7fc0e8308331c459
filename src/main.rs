use clap::Parser;
use jobmatch_api::RestApi;
use jobmatch_core::{EngineConfig, HashingEmbedder, IndexBackend};
use jobmatch_storage::StorageManager;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Semantic job matching service
#[derive(Parser, Debug)]
#[command(name = "jobmatch")]
#[command(about = "Rank job postings against candidate profiles", long_about = None)]
struct Args {
    /// Path to the data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 8000)]
    http_port: u16,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Embedding width
    #[arg(long, default_value_t = jobmatch_core::DEFAULT_EMBEDDING_DIM)]
    embedding_dim: usize,

    /// Vector index backend: auto, flat or brute-force
    #[arg(long, default_value = "auto")]
    index_backend: IndexBackend,

    /// Upper bound on a single embedding call, in milliseconds
    #[arg(long, default_value_t = 30_000)]
    embed_timeout_ms: u64,

    /// Embedder threads allowed at once, counting ones that timed out
    #[arg(long, default_value_t = 32)]
    max_embed_workers: usize,

    /// Keep jobs in memory only
    #[arg(long)]
    no_persist: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting JobMatch v{}", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig {
        embedding_dim: args.embedding_dim,
        index_backend: args.index_backend,
        embed_timeout: Duration::from_millis(args.embed_timeout_ms),
        max_embed_workers: args.max_embed_workers,
        ..Default::default()
    };
    let embedder = Arc::new(HashingEmbedder::new(config.embedding_dim));

    let storage = if args.no_persist {
        StorageManager::in_memory(config, embedder)?
    } else {
        info!("Data directory: {:?}", args.data_dir);
        StorageManager::open(&args.data_dir, config, embedder)?
    };
    let storage = Arc::new(storage);
    info!(jobs = storage.engine().len(), "Storage initialized");

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(storage, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
