use lab_cms::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{InMemoryRepository, PostgresRepository, RepositoryState},
    storage::{S3StorageClient, StorageService, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "lab_cms=debug,tower_http=info,axum=trace";

/// Installs the global subscriber: `RUST_LOG` wins over the default filter; pretty
/// output locally, JSON lines in production.
fn init_tracing(env: Env) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match env {
        Env::Local => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
        Env::Production => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

/// Postgres when `DATABASE_URL` is configured, otherwise the in-memory store.
async fn open_store(config: &AppConfig) -> RepositoryState {
    let Some(db_url) = &config.db_url else {
        tracing::warn!("DATABASE_URL not set; documents live in memory and vanish on restart");
        return Arc::new(InMemoryRepository::new());
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");
    let store = PostgresRepository::new(pool);
    store
        .migrate()
        .await
        .expect("FATAL: Failed to run database migrations.");
    tracing::info!("document store: postgres");
    Arc::new(store)
}

async fn open_storage(config: &AppConfig) -> StorageState {
    let client = S3StorageClient::new(&config.storage);
    if config.env == Env::Local {
        if let Err(e) = client.ensure_bucket_exists().await {
            tracing::warn!("gallery uploads unavailable until MinIO is up: {}", e);
        }
    }
    tracing::info!("gallery bucket: {}", client.bucket());
    Arc::new(client)
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let config = AppConfig::load();
    init_tracing(config.env);

    tracing::info!("lab-cms starting in {:?} mode", config.env);

    let repo = open_store(&config).await;
    let storage = open_storage(&config).await;
    let bind_addr = config.bind_addr.clone();

    let app = create_router(AppState {
        repo,
        storage,
        config,
    });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("listening on {}", bind_addr);
    tracing::info!("API docs at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
    }
}
