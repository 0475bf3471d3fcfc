//! Movie catalog abstraction
//!
//! The catalog is the external source of movie metadata: title search, the
//! browse lists (popular, trending, top rated, now playing), per-movie
//! "similar" lists, genre-filtered discovery and genre tags.
//! TMDB is the only implementation today; the recommendation engine only sees
//! the trait.

use crate::{
    error::AppResult,
    models::{CandidateMovie, MovieId},
};

pub mod genres;
pub mod tmdb;

pub use genres::GenreMap;
pub use tmdb::TmdbCatalog;

/// Parameters for a genre-filtered discovery query
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverQuery {
    /// Catalog genre IDs; a movie must carry all of them to match
    pub genre_ids: Vec<i64>,
    /// Minimum catalog average rating
    pub min_rating: f64,
    /// Sort by average rating descending instead of popularity
    pub sort_by_rating: bool,
}

impl DiscoverQuery {
    /// Stable textual form, used as a cache key
    pub fn canonical(&self) -> String {
        let ids: Vec<String> = self.genre_ids.iter().map(|id| id.to_string()).collect();
        format!(
            "{}|{}|{}",
            ids.join(","),
            self.min_rating,
            self.sort_order()
        )
    }

    /// Catalog sort order for this query
    pub fn sort_order(&self) -> &'static str {
        if self.sort_by_rating {
            "vote_average.desc"
        } else {
            "popularity.desc"
        }
    }
}

/// Trait for movie catalog providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Movies whose title matches `query`, in catalog relevance order
    async fn search(&self, query: String) -> AppResult<Vec<CandidateMovie>>;

    /// Currently popular movies, in catalog order
    async fn get_popular(&self) -> AppResult<Vec<CandidateMovie>>;

    /// Movies trending this week
    async fn get_trending(&self) -> AppResult<Vec<CandidateMovie>>;

    /// Highest rated movies of all time
    async fn get_top_rated(&self) -> AppResult<Vec<CandidateMovie>>;

    /// Movies now playing in theaters
    async fn get_new_releases(&self) -> AppResult<Vec<CandidateMovie>>;

    /// Movies the catalog considers similar to `movie_id`
    async fn get_similar_to(&self, movie_id: MovieId) -> AppResult<Vec<CandidateMovie>>;

    /// Movies matching a genre/rating filter
    async fn discover(&self, query: DiscoverQuery) -> AppResult<Vec<CandidateMovie>>;

    /// Genre names of a movie, in catalog order
    async fn get_genres(&self, movie_id: MovieId) -> AppResult<Vec<String>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_query_canonical() {
        let query = DiscoverQuery {
            genre_ids: vec![28, 18],
            min_rating: 6.5,
            sort_by_rating: true,
        };
        assert_eq!(query.canonical(), "28,18|6.5|vote_average.desc");
    }

    #[test]
    fn test_discover_query_popularity_sort() {
        let query = DiscoverQuery {
            genre_ids: vec![35],
            min_rating: 0.0,
            sort_by_rating: false,
        };
        assert_eq!(query.sort_order(), "popularity.desc");
    }
}
