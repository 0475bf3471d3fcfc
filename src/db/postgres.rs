use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{ReviewStore, DUPLICATE_REVIEW, REVIEW_NOT_FOUND};
use crate::{
    error::{AppError, AppResult},
    models::{MovieId, NewReview, Review, ReviewUpdate},
};

const REVIEW_COLUMNS: &str =
    "id, user_id, movie_id, title, rating, review, genres, watched_date, created_at";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// Review store backed by the `reviews` table
#[derive(Clone)]
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ReviewStore for PgReviewStore {
    async fn list_reviews_for_user(&self, user_id: &str) -> AppResult<Vec<Review>> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            REVIEW_COLUMNS
        );

        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(reviews)
    }

    async fn list_reviews_oldest_first(&self, user_id: &str) -> AppResult<Vec<Review>> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE user_id = $1 ORDER BY id ASC",
            REVIEW_COLUMNS
        );

        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(reviews)
    }

    async fn get_review_by_movie(
        &self,
        user_id: &str,
        movie_id: MovieId,
    ) -> AppResult<Option<Review>> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE user_id = $1 AND movie_id = $2",
            REVIEW_COLUMNS
        );

        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(user_id)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(review)
    }

    async fn create_review(
        &self,
        user_id: &str,
        review: NewReview,
        genres: Vec<String>,
    ) -> AppResult<Review> {
        let sql = format!(
            r#"
            INSERT INTO reviews (user_id, movie_id, title, rating, review, genres, watched_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            REVIEW_COLUMNS
        );

        let result = sqlx::query_as::<_, Review>(&sql)
            .bind(user_id)
            .bind(review.movie_id)
            .bind(&review.title)
            .bind(review.rating)
            .bind(&review.review)
            .bind(&genres)
            .bind(review.watched_date.unwrap_or_else(Utc::now))
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::InvalidInput(DUPLICATE_REVIEW.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_genres(&self, review_id: i64, genres: Vec<String>) -> AppResult<()> {
        let result = sqlx::query("UPDATE reviews SET genres = $1, updated_at = now() WHERE id = $2")
            .bind(&genres)
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Review {} not found", review_id)));
        }

        Ok(())
    }

    async fn update_review(
        &self,
        user_id: &str,
        review_id: i64,
        update: ReviewUpdate,
    ) -> AppResult<Review> {
        let sql = format!(
            r#"
            UPDATE reviews
            SET rating = COALESCE($3, rating),
                review = COALESCE($4, review),
                watched_date = COALESCE($5, watched_date),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            REVIEW_COLUMNS
        );

        sqlx::query_as::<_, Review>(&sql)
            .bind(review_id)
            .bind(user_id)
            .bind(update.rating)
            .bind(update.review)
            .bind(update.watched_date)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(REVIEW_NOT_FOUND.to_string()))
    }

    async fn delete_review(&self, user_id: &str, review_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1 AND user_id = $2")
            .bind(review_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(REVIEW_NOT_FOUND.to_string()));
        }

        Ok(())
    }
}
