use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mosaicord::application::{CollageService, ResolveTokenUseCase, ServiceConfig};
use mosaicord::bot::{CollageBot, sync_commands};
use mosaicord::domain::entities::BotToken;
use mosaicord::domain::ports::{CanvasStorePort, ImageFetchPort, TokenStoragePort};
use mosaicord::infrastructure::{
    CliArgs, Command, DiscordRestClient, FileCanvasStore, FileTokenStorage, HttpImageFetcher,
    LogLevel, StorageManager, prompt_for_token,
};

const LOG_FILE_NAME: &str = "mosaicord.log";

fn init_logging(level: LogLevel, log_path: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);
    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!(path = %log_path.display(), "Logging initialized");
    Ok(())
}

async fn resolve_token(
    storage: Arc<dyn TokenStoragePort>,
    cli_token: Option<String>,
) -> Result<BotToken> {
    let resolver = ResolveTokenUseCase::new(Arc::clone(&storage));

    if let Some(resolved) = resolver.execute(cli_token).await? {
        info!(source = ?resolved.source, token = %resolved.token, "Token resolved");
        return Ok(resolved.token);
    }

    // First start with no token from any source: ask once on stdin.
    let Some(token) = prompt_for_token()? else {
        return Err(eyre!("no valid bot token provided"));
    };
    if let Err(e) = storage.store_token(&token).await {
        warn!(error = %e, "Failed to persist token");
    }
    Ok(token)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let mut args = CliArgs::parse();
    let command = args.command.take();

    let storage_manager = StorageManager::new()?;
    let mut config = storage_manager.load_config(args.config.as_deref())?;
    config.merge_with_args(args);

    let data_dir = config
        .data_dir
        .clone()
        .unwrap_or_else(|| storage_manager.data_dir().to_path_buf());
    let log_path = config
        .log_path
        .clone()
        .unwrap_or_else(|| data_dir.join(LOG_FILE_NAME));

    init_logging(config.log_level, &log_path)?;
    info!(version = mosaicord::VERSION, "Starting Mosaicord");
    std::fs::create_dir_all(&data_dir)?;

    let token_storage: Arc<dyn TokenStoragePort> = Arc::new(FileTokenStorage::new(&data_dir));
    let token = resolve_token(token_storage, config.token.clone()).await?;

    let rest = Arc::new(DiscordRestClient::new(token.clone())?);

    if command == Some(Command::Sync) {
        let count = sync_commands(&rest).await?;
        println!("Registered {count} global command(s).");
        return Ok(());
    }

    let fetcher: Arc<dyn ImageFetchPort> = Arc::new(HttpImageFetcher::with_timeout(
        Duration::from_secs(config.queue.fetch_timeout_secs),
    )?);
    let store: Arc<dyn CanvasStorePort> = Arc::new(FileCanvasStore::new(
        &data_dir,
        config.canvas.width,
        config.canvas.height,
        Arc::clone(&fetcher),
    ));
    let service = CollageService::start(
        store,
        fetcher,
        ServiceConfig {
            queue_capacity: config.queue.capacity,
        },
    );

    CollageBot::new(token, rest, service).run().await
}
