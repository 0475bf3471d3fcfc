use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;

use crate::{
    error::AppResult,
    middleware::{RequestId, UserId},
    models::{MovieId, NewReview, Review, ReviewUpdate},
    routes::AppState,
    services::reviews,
};

#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<Review>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub review: Review,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BackfillResponse {
    pub message: String,
    pub updated: usize,
    pub failed: usize,
}

/// Lists the caller's reviews, newest first
pub async fn list(
    State(state): State<AppState>,
    user: UserId,
) -> AppResult<Json<ReviewListResponse>> {
    let reviews = state.reviews.list_reviews_for_user(user.as_str()).await?;
    Ok(Json(ReviewListResponse { reviews }))
}

/// Creates a review for the caller
pub async fn create(
    State(state): State<AppState>,
    user: UserId,
    Json(request): Json<NewReview>,
) -> AppResult<(StatusCode, Json<ReviewResponse>)> {
    let review = reviews::create_review(
        state.catalog.as_ref(),
        state.reviews.as_ref(),
        user.as_str(),
        request,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ReviewResponse { review })))
}

/// The caller's review of one movie
pub async fn get_by_movie(
    State(state): State<AppState>,
    user: UserId,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<ReviewResponse>> {
    let review =
        reviews::get_review_by_movie(state.reviews.as_ref(), user.as_str(), movie_id).await?;
    Ok(Json(ReviewResponse { review }))
}

pub async fn update(
    State(state): State<AppState>,
    user: UserId,
    Path(review_id): Path<i64>,
    Json(request): Json<ReviewUpdate>,
) -> AppResult<Json<ReviewResponse>> {
    let review =
        reviews::update_review(state.reviews.as_ref(), user.as_str(), review_id, request).await?;
    Ok(Json(ReviewResponse { review }))
}

pub async fn delete(
    State(state): State<AppState>,
    user: UserId,
    Path(review_id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    reviews::delete_review(state.reviews.as_ref(), user.as_str(), review_id).await?;

    Ok(Json(MessageResponse {
        message: "Review deleted successfully".to_string(),
    }))
}

/// Fills in genres for the caller's untagged reviews
pub async fn backfill_genres(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    user: UserId,
) -> AppResult<Json<BackfillResponse>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user,
        "Processing genre backfill request"
    );

    let report = state.engine.backfill_genres(user.as_str()).await?;

    let message = if report.is_noop() {
        "All reviews already have genres".to_string()
    } else {
        format!(
            "Backfill complete. Updated {} reviews, {} failed.",
            report.updated, report.failed
        )
    };

    Ok(Json(BackfillResponse {
        message,
        updated: report.updated,
        failed: report.failed,
    }))
}
