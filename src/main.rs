//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run the bot.
//! No business logic here.

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tg_shortener::adapters::persistence::{JsonUsageStore, MemoryUsageStore};
use tg_shortener::adapters::shortener::{CuttlyAdapter, MockShortener};
use tg_shortener::adapters::telegram::TelegramBot;
use tg_shortener::ports::{InputPort, ShortenerPort, UsageStorePort};
use tg_shortener::shared::config::AppConfig;
use tg_shortener::usecases::{BulkPolicy, BulkProcessor, CommandRouter, ShorteningClient};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("config: {}", e))?;
    let Some(token) = cfg.telegram_bot_token() else {
        anyhow::bail!("Set TELEGRAM_BOT_TOKEN (env or .env). Get one from @BotFather");
    };

    // --- Shortener: Cuttly when a key is present, otherwise dry-run mock ---
    let timeout = Duration::from_secs(cfg.request_timeout_secs_or_default());
    let shortener: Arc<dyn ShortenerPort> = match cfg.cuttly_api_key() {
        Some(key) => {
            info!(url = %cfg.cuttly_api_url_or_default(), "Cuttly shortener enabled");
            Arc::new(CuttlyAdapter::new(cfg.cuttly_api_url_or_default(), key, timeout))
        }
        None => {
            warn!("CUTTLY_API_KEY not set, using mock shortener (dry run)");
            Arc::new(MockShortener::new())
        }
    };

    // --- Usage store: JSON snapshot when a path is configured, otherwise in-memory ---
    let capacity = cfg.recent_capacity_or_default();
    let store: Arc<dyn UsageStorePort> = match cfg.stats_path.as_deref() {
        Some(path) => {
            let json = JsonUsageStore::new(path, capacity);
            json.load().await.map_err(|e| anyhow::anyhow!("{}", e))?;
            info!(path, "usage stats persisted to JSON");
            Arc::new(json)
        }
        None => {
            info!("usage stats kept in memory (set TG_SHORTENER_STATS_PATH to persist)");
            Arc::new(MemoryUsageStore::new(capacity))
        }
    };

    // --- Services ---
    let policy = BulkPolicy {
        max_concurrency: cfg.max_concurrency_or_default(),
        max_batch_size: cfg.max_batch_size_or_default(),
        retry_backoff: Duration::from_millis(cfg.retry_backoff_ms_or_default()),
    };
    info!(
        max_concurrency = policy.max_concurrency,
        max_batch_size = policy.max_batch_size,
        timeout_secs = timeout.as_secs(),
        "bulk policy"
    );
    let client = Arc::new(ShorteningClient::new(shortener, timeout));
    let bulk = Arc::new(BulkProcessor::new(client, Arc::clone(&store), policy));
    let router = Arc::new(CommandRouter::new(bulk, store, cfg.qr_api_url_or_default()));

    let input_port: Arc<dyn InputPort> = Arc::new(TelegramBot::new(token, router));
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
