use std::sync::Arc;

use movie_ranker_api::{
    config::Config,
    db::{create_pool, create_redis_client, Cache, MemoryReviewStore, PgReviewStore, ReviewStore},
    routes::{create_router, AppState},
    services::catalog::{GenreMap, TmdbCatalog},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movie_ranker_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let genre_map = match &config.genre_map_path {
        Some(path) => GenreMap::from_json_file(path)?,
        None => GenreMap::default(),
    };

    let reviews: Arc<dyn ReviewStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            tracing::info!("Connected to PostgreSQL review store");
            Arc::new(PgReviewStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, reviews will be kept in memory");
            Arc::new(MemoryReviewStore::new())
        }
    };

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client);

    let catalog = Arc::new(TmdbCatalog::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_image_base.clone(),
    ));

    let state = AppState::new(catalog, reviews, genre_map);
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
