use crate::{
    error::AppResult,
    models::{MovieId, NewReview, Review, ReviewUpdate},
};

pub mod memory;
pub mod postgres;
pub mod redis;

pub use memory::MemoryReviewStore;
pub use postgres::{create_pool, PgReviewStore};
pub use self::redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};

/// Persistence for user reviews
///
/// The recommendation engine only reads through this trait; genre backfill and
/// review creation are the only writers.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ReviewStore: Send + Sync {
    /// All reviews owned by `user_id`, newest first
    async fn list_reviews_for_user(&self, user_id: &str) -> AppResult<Vec<Review>>;

    /// All reviews owned by `user_id`, in the order they were written
    async fn list_reviews_oldest_first(&self, user_id: &str) -> AppResult<Vec<Review>>;

    /// The user's review of `movie_id`, if any
    async fn get_review_by_movie(
        &self,
        user_id: &str,
        movie_id: MovieId,
    ) -> AppResult<Option<Review>>;

    /// Stores a new review with the given genre tags
    ///
    /// Fails with `InvalidInput` if the user already reviewed the movie.
    async fn create_review(
        &self,
        user_id: &str,
        review: NewReview,
        genres: Vec<String>,
    ) -> AppResult<Review>;

    /// Replaces the genre tags of an existing review
    async fn set_genres(&self, review_id: i64, genres: Vec<String>) -> AppResult<()>;

    /// Applies the fields present in `update` to one of the user's reviews
    ///
    /// Fails with `NotFound` if the review does not exist or belongs to
    /// another user.
    async fn update_review(
        &self,
        user_id: &str,
        review_id: i64,
        update: ReviewUpdate,
    ) -> AppResult<Review>;

    /// Deletes one of the user's reviews, `NotFound` if there is no such review
    async fn delete_review(&self, user_id: &str, review_id: i64) -> AppResult<()>;
}

pub(crate) const DUPLICATE_REVIEW: &str = "Review already exists for this movie";
pub(crate) const REVIEW_NOT_FOUND: &str = "Review not found";
