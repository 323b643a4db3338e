use std::sync::Arc;

use marquee_api::{
    config::Config,
    create_router, db,
    services::{MemoryStore, MetadataProvider, PgStore, Store, TmdbProvider, TokenIssuer},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url, config.db_max_connections).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let catalog: Arc<dyn MetadataProvider> = Arc::new(TmdbProvider::from_config(&config));
    tracing::info!(provider = catalog.name(), "Metadata provider configured");

    let state = Arc::new(AppState::new(
        catalog,
        store,
        TokenIssuer::new(&config.jwt_secret, config.token_ttl_minutes),
        config.bcrypt_cost,
    ));

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(addr = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
