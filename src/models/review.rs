use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MovieId;

/// A user's rating and review of a single movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub user_id: String,
    pub movie_id: MovieId,
    pub title: String,
    /// Rating on a 0-10 scale
    pub rating: f64,
    pub review: String,
    /// Genre names in catalog order; empty for reviews stored before tagging
    pub genres: Vec<String>,
    pub watched_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Whether this review still needs its genres backfilled
    pub fn missing_genres(&self) -> bool {
        self.genres.is_empty()
    }
}

/// Payload for creating a review
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NewReview {
    pub movie_id: MovieId,
    pub title: String,
    pub rating: f64,
    pub review: String,
    #[serde(default)]
    pub watched_date: Option<DateTime<Utc>>,
}

impl NewReview {
    pub const MIN_RATING: f64 = 0.0;
    pub const MAX_RATING: f64 = 10.0;

    pub fn rating_in_range(&self) -> bool {
        (Self::MIN_RATING..=Self::MAX_RATING).contains(&self.rating)
    }
}

/// Payload for editing a review; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ReviewUpdate {
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub watched_date: Option<DateTime<Utc>>,
}

impl ReviewUpdate {
    pub fn rating_in_range(&self) -> bool {
        self.rating.map_or(true, |rating| {
            (NewReview::MIN_RATING..=NewReview::MAX_RATING).contains(&rating)
        })
    }

    /// Applies the present fields to `review`
    pub fn apply_to(self, review: &mut Review) {
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(text) = self.review {
            review.review = text;
        }
        if let Some(watched_date) = self.watched_date {
            review.watched_date = watched_date;
        }
    }
}

/// Outcome of a genre backfill run
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct BackfillReport {
    pub updated: usize,
    pub failed: usize,
}

impl BackfillReport {
    pub fn is_noop(&self) -> bool {
        self.updated == 0 && self.failed == 0
    }
}
