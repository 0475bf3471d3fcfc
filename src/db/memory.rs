use chrono::Utc;
use tokio::sync::RwLock;

use super::{ReviewStore, DUPLICATE_REVIEW, REVIEW_NOT_FOUND};
use crate::{
    error::{AppError, AppResult},
    models::{MovieId, NewReview, Review, ReviewUpdate},
};

/// Process-local review store
///
/// Used when no database is configured, and by the integration tests.
/// Reviews are kept in the order they were written.
#[derive(Default)]
pub struct MemoryReviewStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    reviews: Vec<Review>,
    next_id: i64,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `reviews`, keeping their IDs
    pub fn with_reviews(reviews: Vec<Review>) -> Self {
        let next_id = reviews.iter().map(|r| r.id).max().unwrap_or(0);
        Self {
            inner: RwLock::new(MemoryInner { reviews, next_id }),
        }
    }
}

#[async_trait::async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn list_reviews_for_user(&self, user_id: &str) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        let mut reviews: Vec<Review> = inner
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();

        reviews.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(reviews)
    }

    async fn list_reviews_oldest_first(&self, user_id: &str) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_review_by_movie(
        &self,
        user_id: &str,
        movie_id: MovieId,
    ) -> AppResult<Option<Review>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .iter()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
            .cloned())
    }

    async fn create_review(
        &self,
        user_id: &str,
        review: NewReview,
        genres: Vec<String>,
    ) -> AppResult<Review> {
        let mut inner = self.inner.write().await;

        if inner
            .reviews
            .iter()
            .any(|r| r.user_id == user_id && r.movie_id == review.movie_id)
        {
            return Err(AppError::InvalidInput(DUPLICATE_REVIEW.to_string()));
        }

        inner.next_id += 1;
        let now = Utc::now();
        let created = Review {
            id: inner.next_id,
            user_id: user_id.to_string(),
            movie_id: review.movie_id,
            title: review.title,
            rating: review.rating,
            review: review.review,
            genres,
            watched_date: review.watched_date.unwrap_or(now),
            created_at: now,
        };

        inner.reviews.push(created.clone());
        Ok(created)
    }

    async fn set_genres(&self, review_id: i64, genres: Vec<String>) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let review = inner
            .reviews
            .iter_mut()
            .find(|r| r.id == review_id)
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", review_id)))?;

        review.genres = genres;
        Ok(())
    }

    async fn update_review(
        &self,
        user_id: &str,
        review_id: i64,
        update: ReviewUpdate,
    ) -> AppResult<Review> {
        let mut inner = self.inner.write().await;
        let review = inner
            .reviews
            .iter_mut()
            .find(|r| r.id == review_id && r.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(REVIEW_NOT_FOUND.to_string()))?;

        update.apply_to(review);
        Ok(review.clone())
    }

    async fn delete_review(&self, user_id: &str, review_id: i64) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let before = inner.reviews.len();
        inner
            .reviews
            .retain(|r| !(r.id == review_id && r.user_id == user_id));

        if inner.reviews.len() == before {
            return Err(AppError::NotFound(REVIEW_NOT_FOUND.to_string()));
        }

        Ok(())
    }
}
