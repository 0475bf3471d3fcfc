use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    middleware::{RequestId, UserId},
    models::CandidateMovie,
    routes::AppState,
};

#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub results: Vec<CandidateMovie>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Handler for title search, `?q=<title>`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<MovieListResponse>> {
    let results = state.catalog.search(params.q).await?;
    Ok(Json(MovieListResponse { results }))
}

/// Handler for the popular movies endpoint
pub async fn popular(State(state): State<AppState>) -> AppResult<Json<MovieListResponse>> {
    let results = state.catalog.get_popular().await?;
    Ok(Json(MovieListResponse { results }))
}

pub async fn trending(State(state): State<AppState>) -> AppResult<Json<MovieListResponse>> {
    let results = state.catalog.get_trending().await?;
    Ok(Json(MovieListResponse { results }))
}

pub async fn top_rated(State(state): State<AppState>) -> AppResult<Json<MovieListResponse>> {
    let results = state.catalog.get_top_rated().await?;
    Ok(Json(MovieListResponse { results }))
}

pub async fn new_releases(State(state): State<AppState>) -> AppResult<Json<MovieListResponse>> {
    let results = state.catalog.get_new_releases().await?;
    Ok(Json(MovieListResponse { results }))
}

/// Handler for the recommendations endpoint
pub async fn recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    user: UserId,
) -> AppResult<Json<MovieListResponse>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user,
        "Processing recommendation request"
    );

    let results = state.engine.recommend(user.as_str()).await?;

    Ok(Json(MovieListResponse { results }))
}
