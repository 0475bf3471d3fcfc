use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::ReviewStore,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{
        catalog::{CatalogService, GenreMap},
        RecommendationEngine,
    },
};

pub mod movies;
pub mod reviews;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub catalog: Arc<dyn CatalogService>,
    pub reviews: Arc<dyn ReviewStore>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        reviews: Arc<dyn ReviewStore>,
        genre_map: GenreMap,
    ) -> Self {
        let engine = RecommendationEngine::new(catalog.clone(), reviews.clone(), genre_map);

        Self {
            engine: Arc::new(engine),
            catalog,
            reviews,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        // Added after the trace layer so the ID exists when the span is built
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/movies/search", get(movies::search))
        .route("/movies/popular", get(movies::popular))
        .route("/movies/trending", get(movies::trending))
        .route("/movies/top-rated", get(movies::top_rated))
        .route("/movies/new-releases", get(movies::new_releases))
        .route("/movies/recommendations", get(movies::recommendations))
        .route("/reviews", get(reviews::list).post(reviews::create))
        .route("/reviews/backfill-genres", post(reviews::backfill_genres))
        .route("/reviews/movie/:movie_id", get(reviews::get_by_movie))
        .route("/reviews/:id", put(reviews::update).delete(reviews::delete))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
