use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paperloft_api::{cors_layer, router, ApiConfig, AppState, Services};
use paperloft_core::{DocumentStore, Library, LocalStore};
use paperloft_db::{create_pool, MemoryDocumentStore, PgDocumentStore, PoolConfig, SledKeyValueStore};
use paperloft_jobs::{EnrichmentWorker, WorkerConfig, WorkerEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "paperloft_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "paperloft_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("paperloft-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ApiConfig::from_env();

    // Local state
    std::fs::create_dir_all(&config.data_dir)?;
    let kv = SledKeyValueStore::open(&config.data_dir)?;
    let library = Arc::new(Library::new(LocalStore::new(Arc::new(kv))));
    info!(data_dir = %config.data_dir.display(), "Local store opened");

    // Cloud document store
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url, PoolConfig::from_env()).await?;
            let pg = PgDocumentStore::new(pool);
            pg.migrate().await?;
            let _listener = pg.spawn_listener().await?;
            info!("Using PostgreSQL document store");
            Arc::new(pg)
        }
        None => {
            warn!("DATABASE_URL not set, cloud sync uses an in-memory store");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    let mut state = AppState::new(library, store, Services::from_env()?);

    // Enrichment worker
    let worker_config = WorkerConfig::from_env();
    let worker = if worker_config.enabled {
        let handle = EnrichmentWorker::new(state.enricher.clone(), worker_config).start();
        state = state.with_queue(handle.queue());
        tokio::spawn(log_worker_events(handle.events()));
        Some(handle)
    } else {
        info!("Enrichment worker disabled");
        None
    };

    let app = router(state).layer(cors_layer(&config));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = worker {
        if let Err(e) = handle.shutdown().await {
            warn!(error = %e, "Enrichment worker did not acknowledge shutdown");
        }
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn log_worker_events(mut events: tokio::sync::broadcast::Receiver<WorkerEvent>) {
    use tokio::sync::broadcast::error::RecvError;
    loop {
        match events.recv().await {
            Ok(WorkerEvent::JobFailed { bookmark_id, error }) => {
                warn!(subsystem = "api", bookmark_id = %bookmark_id, error = %error, "Enrichment failed");
            }
            Ok(event) => tracing::debug!(subsystem = "api", ?event, "Worker event"),
            Err(RecvError::Lagged(skipped)) => {
                warn!(subsystem = "api", skipped, "Worker event stream lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
