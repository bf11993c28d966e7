use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

use iaoms::{
    auth::jwt::JwtService,
    clock::{Clock, SystemClock, TokioTimer},
    config::AppConfig,
    db,
    directory::RecipientDirectory,
    meetings::MeetingsClient,
    notifications::{EmergencyScheduler, PushGateway, TracingPushGateway, WebhookPushGateway},
    routes,
    state::{AppParts, AppState},
    store::{MemoryStore, PgRecordStore, RecordStore},
    summary::DocumentSummarizer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "api",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        ai_configured = config.ai_api_key.is_some(),
        meetings_remote = config.meetings_api_url.is_some(),
        "loaded configuration"
    );

    let store: Arc<dyn RecordStore> = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::init_pool_with_size(url, config.database_max_pool_size)?;
            db::run_migrations(&pool)?;
            Arc::new(PgRecordStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; records are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let directory = RecipientDirectory::load(config.recipient_directory_path.as_deref())?;
    tracing::info!(recipients = directory.len(), "recipient directory loaded");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let push: Arc<dyn PushGateway> = match config.push_webhook_url.as_deref() {
        Some(url) => Arc::new(WebhookPushGateway::new(url, config.http_timeout())?),
        None => Arc::new(TracingPushGateway),
    };
    let scheduler = EmergencyScheduler::new(
        store.clone(),
        Arc::new(TokioTimer),
        clock.clone(),
        push,
        config.notification_log_capacity,
        config.emergency_submission_capacity,
    );
    scheduler
        .restore()
        .await
        .context("failed to restore notification schedules")?;
    let summarizer = DocumentSummarizer::new(
        config.ai_api_url.clone(),
        config.ai_api_key.clone(),
        config.ai_model.clone(),
        config.http_timeout(),
    )?;
    let meetings = MeetingsClient::new(
        config.meetings_api_url.clone(),
        config.http_timeout(),
        store.clone(),
        clock.clone(),
    )?;
    let jwt = JwtService::from_config(&config)?;

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("SERVER_HOST/SERVER_PORT do not form a socket address")?;

    let state = AppState::new(AppParts {
        config,
        store,
        directory,
        clock,
        scheduler,
        summarizer,
        meetings,
        jwt,
    });
    let app = routes::create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
