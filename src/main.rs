use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shortenme::app::create_app;
use shortenme::config::{AuthMode, Config};
use shortenme::storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shortenme=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    info!("Initializing database...");
    let storage = storage::connect(&config.database).await?;
    info!("Database initialized successfully");

    match config.auth.mode {
        AuthMode::None => {
            info!("🔓 Authentication is disabled - all privileged requests are allowed");
        }
        AuthMode::ApiKey => {
            info!("🔐 API key authentication enabled (header: X-API-Key)");
        }
    }

    let app = create_app(storage, &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on http://{}", addr);
    info!("   - Short links are issued under {}", config.deploy_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
