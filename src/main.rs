//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here; authentication is delegated to AuthService.

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tg_contacts::adapters::mock::MockContactGateway;
use tg_contacts::adapters::persistence::JsonlLedger;
use tg_contacts::adapters::telegram::{GrammersAuthAdapter, GrammersContactGateway, session};
use tg_contacts::adapters::ui::{ProgressObserver, TuiInputPort, TuiLoginPrompt};
use tg_contacts::ports::{AuthPort, ContactGateway, InputPort, LedgerSink};
use tg_contacts::shared::config::AppConfig;
use tg_contacts::usecases::{AuthService, ImportService};
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

    tg_contacts::adapters::ui::init_ui();

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config could not be read; using defaults");
        AppConfig::default()
    });
    let run_config = cfg.run_config();
    let data_dir = cfg.data_dir_or_default();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("create data dir: {}", e))?;
    info!(
        path = %data_dir.display(),
        default_country = %run_config.default_country,
        batch_size = run_config.batch_size,
        batch_delay_ms = run_config.batch_delay_ms,
        "settings loaded"
    );

    let history = Arc::new(JsonlLedger::new(data_dir.join("ledger.jsonl")));
    let gateway = build_gateway(&cfg).await?;

    if !gateway.connect().await.map_err(|e| anyhow::anyhow!("{}", e))? {
        anyhow::bail!("Telegram session is not authorized");
    }

    let service = Arc::new(
        ImportService::new(gateway, run_config)
            .with_observer(Arc::new(ProgressObserver::new()))
            .with_ledger_sink(Arc::clone(&history) as Arc<dyn LedgerSink>),
    );
    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(service, history, &data_dir));

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}

/// Telegram gateway after the login flow, or the in-memory one for dry runs.
async fn build_gateway(cfg: &AppConfig) -> anyhow::Result<Arc<dyn ContactGateway>> {
    if cfg.is_dry_run() {
        warn!("dry run: contacts are imported into an in-memory list, not Telegram");
        return Ok(Arc::new(MockContactGateway::new()));
    }

    let api_hash = cfg.api_hash.clone().unwrap_or_default();
    if api_hash.is_empty() {
        anyhow::bail!("Set TG_CONTACTS_API_HASH (env or .env). Get from https://my.telegram.org");
    }
    let client = session::connect_client(&cfg.session_path_or_default(), cfg.api_id.unwrap_or(0))
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let auth: Arc<dyn AuthPort> = Arc::new(GrammersAuthAdapter::new(client.clone()));
    AuthService::new(auth, api_hash)
        .run_auth_flow(&TuiLoginPrompt)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(Arc::new(GrammersContactGateway::new(client)))
}
