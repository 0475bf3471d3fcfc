use crate::{
    db::ReviewStore,
    error::{AppError, AppResult},
    models::{MovieId, NewReview, Review, ReviewUpdate},
    services::catalog::CatalogService,
};

/// Creates a review, tagging it with the movie's catalog genres
///
/// Genre tagging is best-effort: if the catalog lookup fails the review is
/// stored without genres and can be fixed later by the genre backfill.
pub async fn create_review(
    catalog: &dyn CatalogService,
    store: &dyn ReviewStore,
    user_id: &str,
    new_review: NewReview,
) -> AppResult<Review> {
    if !new_review.rating_in_range() {
        return Err(AppError::InvalidInput(format!(
            "Rating must be between {} and {}",
            NewReview::MIN_RATING,
            NewReview::MAX_RATING
        )));
    }

    let genres = match catalog.get_genres(new_review.movie_id).await {
        Ok(genres) => genres,
        Err(e) => {
            tracing::warn!(
                movie_id = new_review.movie_id,
                error = %e,
                "Could not fetch genres, storing review untagged"
            );
            Vec::new()
        }
    };

    let review = store.create_review(user_id, new_review, genres).await?;

    tracing::info!(
        user_id = %user_id,
        review_id = review.id,
        movie_id = review.movie_id,
        genres = review.genres.len(),
        "Review created"
    );

    Ok(review)
}

/// The user's review of `movie_id`, `NotFound` when they have not reviewed it
pub async fn get_review_by_movie(
    store: &dyn ReviewStore,
    user_id: &str,
    movie_id: MovieId,
) -> AppResult<Review> {
    store
        .get_review_by_movie(user_id, movie_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No review for movie {}", movie_id)))
}

/// Edits rating, text or watch date of one of the user's reviews
pub async fn update_review(
    store: &dyn ReviewStore,
    user_id: &str,
    review_id: i64,
    update: ReviewUpdate,
) -> AppResult<Review> {
    if !update.rating_in_range() {
        return Err(AppError::InvalidInput(format!(
            "Rating must be between {} and {}",
            NewReview::MIN_RATING,
            NewReview::MAX_RATING
        )));
    }

    let review = store.update_review(user_id, review_id, update).await?;

    tracing::info!(user_id = %user_id, review_id, rating = review.rating, "Review updated");

    Ok(review)
}

pub async fn delete_review(
    store: &dyn ReviewStore,
    user_id: &str,
    review_id: i64,
) -> AppResult<()> {
    store.delete_review(user_id, review_id).await?;

    tracing::info!(user_id = %user_id, review_id, "Review deleted");

    Ok(())
}
