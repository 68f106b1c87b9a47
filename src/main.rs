use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sheetscribe::config::Config;
use sheetscribe::middleware::apply_cors;
use sheetscribe::models::AppState;
use sheetscribe::storage::ArtifactStore;
use sheetscribe::store::RecordStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheetscribe=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    // Prepare the durable stores
    let store = RecordStore::new(&config.storage.data_dir);
    store.init().await?;
    let artifacts = ArtifactStore::new(&config.storage.data_dir);
    artifacts.init().await?;
    info!(data_dir = %config.storage.data_dir.display(), "Stores initialized");

    // Create shared state and router
    let state = AppState {
        config: config.clone(),
        store,
        artifacts,
    };
    let app = apply_cors(sheetscribe::create_router(state), &config.server.cors_allowed_origins);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|err| anyhow::anyhow!("Server error: {}", err))?;

    Ok(())
}
