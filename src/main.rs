use tracing_subscriber::EnvFilter;

use doc_chat::config::Config;
use doc_chat::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Storage container: {:?}", config.storage.container_name);
    tracing::info!("Search index: {:?}", config.search.index_name);
    tracing::info!("Chat deployment: {:?}", config.ai.deployment);

    let state = AppState::new(config.clone())?;

    // No CORS layer: the SPA is served from the same origin so cross-origin
    // access is unnecessary. This prevents drive-by attacks from malicious pages.
    let app = doc_chat::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
