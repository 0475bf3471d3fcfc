//! TMDB (The Movie Database) catalog provider
//!
//! API Flow:
//! 1. Search: /search/movie?query=
//! 2. Browse: /movie/popular, /trending/movie/week, /movie/top_rated,
//!    /movie/now_playing
//! 3. Similar: /movie/{id}/recommendations
//! 4. Discover: /discover/movie with genre and rating filters
//! 5. Genres: /movie/{id} → genres[].name
//!
//! All list endpoints return the first page (20 movies). Responses go through
//! the Redis read-through cache.

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{CandidateMovie, MovieId, TmdbMovieDetails, TmdbPage},
    services::catalog::{CatalogService, DiscoverQuery},
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const POPULAR_CACHE_TTL: u64 = 3600; // 1 hour
const TRENDING_CACHE_TTL: u64 = 3600; // 1 hour
const TOP_RATED_CACHE_TTL: u64 = 86400; // 1 day
const NEW_RELEASES_CACHE_TTL: u64 = 21600; // 6 hours
const SIMILAR_CACHE_TTL: u64 = 86400; // 1 day
const DISCOVER_CACHE_TTL: u64 = 21600; // 6 hours
const GENRES_CACHE_TTL: u64 = 604800; // 1 week

/// Discover results are limited to movies with a meaningful number of votes
const DISCOVER_MIN_VOTES: u32 = 100;

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base: String,
    cache: Cache,
}

impl TmdbCatalog {
    pub fn new(cache: Cache, api_key: String, api_url: String, image_base: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            image_base,
            cache,
        }
    }

    /// Search text as sent to TMDB and used in the cache key
    fn normalize_query(query: &str) -> String {
        query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }

    /// Fetches one of the plain browse lists
    async fn fetch_list(
        &self,
        path: &str,
        label: &'static str,
    ) -> AppResult<Vec<CandidateMovie>> {
        let movies = self.fetch_page(path, &[]).await?;

        tracing::info!(
            list = label,
            results = movies.len(),
            provider = "tmdb",
            "Movie list fetched"
        );

        Ok(movies)
    }

    /// Query parameters for GET /discover/movie
    fn discover_params(query: &DiscoverQuery) -> Vec<(&'static str, String)> {
        let genre_ids: Vec<String> = query.genre_ids.iter().map(|id| id.to_string()).collect();

        vec![
            ("with_genres", genre_ids.join(",")),
            ("vote_average.gte", query.min_rating.to_string()),
            ("vote_count.gte", DISCOVER_MIN_VOTES.to_string()),
            ("sort_by", query.sort_order().to_string()),
        ]
    }

    /// Issues an authenticated GET and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {} for {}: {}",
                status, path, body
            )));
        }

        let response_text = response.text().await?;

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                "Failed to deserialize TMDB response"
            );
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }

    /// Fetches a movie list endpoint and converts it to candidates
    async fn fetch_page(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<Vec<CandidateMovie>> {
        let page: TmdbPage = self.get_json(path, params).await?;

        Ok(page
            .results
            .into_iter()
            .map(|movie| CandidateMovie::from_tmdb(movie, &self.image_base))
            .collect())
    }
}

#[async_trait::async_trait]
impl CatalogService for TmdbCatalog {
    async fn search(&self, query: String) -> AppResult<Vec<CandidateMovie>> {
        let query = Self::normalize_query(&query);
        if query.is_empty() {
            return Err(AppError::InvalidInput("Search query (q) is required".to_string()));
        }

        cached!(
            self.cache,
            CacheKey::Search(query.clone()),
            SEARCH_CACHE_TTL,
            async move {
                let params = [("query", query.clone())];
                let movies = self.fetch_page("/search/movie", &params).await?;

                tracing::info!(
                    query = %query,
                    results = movies.len(),
                    provider = "tmdb",
                    "Movie search completed"
                );

                Ok::<_, AppError>(movies)
            }
        )
    }

    async fn get_popular(&self) -> AppResult<Vec<CandidateMovie>> {
        cached!(self.cache, CacheKey::Popular, POPULAR_CACHE_TTL, async move {
            self.fetch_list("/movie/popular", "popular").await
        })
    }

    async fn get_trending(&self) -> AppResult<Vec<CandidateMovie>> {
        cached!(self.cache, CacheKey::Trending, TRENDING_CACHE_TTL, async move {
            self.fetch_list("/trending/movie/week", "trending").await
        })
    }

    async fn get_top_rated(&self) -> AppResult<Vec<CandidateMovie>> {
        cached!(self.cache, CacheKey::TopRated, TOP_RATED_CACHE_TTL, async move {
            self.fetch_list("/movie/top_rated", "top_rated").await
        })
    }

    async fn get_new_releases(&self) -> AppResult<Vec<CandidateMovie>> {
        cached!(
            self.cache,
            CacheKey::NewReleases,
            NEW_RELEASES_CACHE_TTL,
            async move { self.fetch_list("/movie/now_playing", "new_releases").await }
        )
    }

    async fn get_similar_to(&self, movie_id: MovieId) -> AppResult<Vec<CandidateMovie>> {
        cached!(
            self.cache,
            CacheKey::SimilarTo(movie_id),
            SIMILAR_CACHE_TTL,
            async move {
                let path = format!("/movie/{}/recommendations", movie_id);
                let movies = self.fetch_page(&path, &[]).await?;

                tracing::info!(
                    movie_id,
                    results = movies.len(),
                    provider = "tmdb",
                    "Similar movies fetched"
                );

                Ok::<_, AppError>(movies)
            }
        )
    }

    async fn discover(&self, query: DiscoverQuery) -> AppResult<Vec<CandidateMovie>> {
        cached!(
            self.cache,
            CacheKey::Discover(query.canonical()),
            DISCOVER_CACHE_TTL,
            async move {
                let params = Self::discover_params(&query);
                let movies = self.fetch_page("/discover/movie", &params).await?;

                tracing::info!(
                    genre_ids = ?query.genre_ids,
                    results = movies.len(),
                    provider = "tmdb",
                    "Discover query completed"
                );

                Ok::<_, AppError>(movies)
            }
        )
    }

    async fn get_genres(&self, movie_id: MovieId) -> AppResult<Vec<String>> {
        cached!(
            self.cache,
            CacheKey::MovieGenres(movie_id),
            GENRES_CACHE_TTL,
            async move {
                let path = format!("/movie/{}", movie_id);
                let details: TmdbMovieDetails = self.get_json(&path, &[]).await?;

                let genres: Vec<String> = details.genres.into_iter().map(|g| g.name).collect();

                tracing::debug!(movie_id = details.id, genres = ?genres, "Movie genres fetched");

                Ok::<_, AppError>(genres)
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
