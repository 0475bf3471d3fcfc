use std::sync::Arc;

use tracing::instrument;

use crate::{
    db::ReviewStore,
    error::{AppError, AppResult},
    models::{BackfillReport, CandidateMovie, Review},
    services::catalog::{CatalogService, DiscoverQuery, GenreMap},
};

pub mod scoring;

pub use scoring::{select_seeds, CandidatePool, GenreScore};

/// Reviews rated at least this high can seed "similar movie" lookups
const SEED_MIN_RATING: f64 = 7.0;
const MAX_SEEDS: usize = 5;
/// Only the strongest seeds are sent to the catalog
const MAX_SIMILAR_LOOKUPS: usize = 3;
const TOP_GENRE_COUNT: usize = 3;
const DISCOVER_MIN_RATING: f64 = 6.5;
/// Below this many candidates the list is topped up with popular movies
const BACKFILL_THRESHOLD: usize = 10;
pub const MAX_RECOMMENDATIONS: usize = 20;

/// Counts catalog calls made while serving one request
#[derive(Debug, Default)]
struct LookupTally {
    attempted: usize,
    succeeded: usize,
}

impl LookupTally {
    fn record<T>(&mut self, result: &AppResult<T>) {
        self.attempted += 1;
        if result.is_ok() {
            self.succeeded += 1;
        }
    }

    fn all_failed(&self) -> bool {
        self.attempted > 0 && self.succeeded == 0
    }
}

/// Generates personalized movie recommendations from a user's review history
///
/// Candidates come from three catalog sources, in priority order:
/// 1. Movies similar to the user's highest-rated reviews
/// 2. A discovery query over the user's most heavily weighted genres
/// 3. Popular movies, only when the first two yield too few results
///
/// Individual catalog failures shrink the candidate pool instead of failing
/// the request.
pub struct RecommendationEngine {
    catalog: Arc<dyn CatalogService>,
    reviews: Arc<dyn ReviewStore>,
    genre_map: GenreMap,
}

impl RecommendationEngine {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        reviews: Arc<dyn ReviewStore>,
        genre_map: GenreMap,
    ) -> Self {
        Self {
            catalog,
            reviews,
            genre_map,
        }
    }

    /// Ranked recommendations for `user_id`
    ///
    /// Users without reviews get the catalog's popular list unchanged.
    /// Otherwise the result holds at most [`MAX_RECOMMENDATIONS`] movies, none
    /// of which the user has reviewed, with no duplicates.
    #[instrument(skip(self))]
    pub async fn recommend(&self, user_id: &str) -> AppResult<Vec<CandidateMovie>> {
        let reviews = self.reviews.list_reviews_oldest_first(user_id).await?;

        if reviews.is_empty() {
            tracing::info!(user_id = %user_id, "No reviews yet, using popular movies");
            return self.catalog.get_popular().await.map_err(|e| {
                tracing::error!(error = %e, provider = self.catalog.name(), "Popular movies unavailable");
                AppError::CatalogUnavailable(e.to_string())
            });
        }

        let mut tally = LookupTally::default();
        let mut pool = CandidatePool::new(reviews.iter().map(|r| r.movie_id));

        // 1. Movie-based candidates
        let seeds = select_seeds(&reviews, SEED_MIN_RATING, MAX_SEEDS);
        let similar = self.similar_to_seeds(&seeds, &mut tally).await;
        pool.extend(similar);

        // 2. Genre-based candidates
        let genre_scores = GenreScore::from_reviews(&reviews);
        let top_genres = genre_scores.top(TOP_GENRE_COUNT);
        let genre_ids = self.genre_map.ids_for(top_genres.iter().copied());
        let top_weights: Vec<f64> = top_genres
            .iter()
            .filter_map(|genre| genre_scores.weight(genre))
            .collect();

        if !genre_ids.is_empty() {
            let query = DiscoverQuery {
                genre_ids,
                min_rating: DISCOVER_MIN_RATING,
                sort_by_rating: true,
            };
            let result = self.catalog.discover(query).await;
            tally.record(&result);
            match result {
                Ok(movies) => pool.extend(movies),
                Err(e) => tracing::warn!(
                    error = %e,
                    genres = ?top_genres,
                    "Genre discovery failed, continuing without it"
                ),
            }
        } else if !top_genres.is_empty() {
            tracing::debug!(genres = ?top_genres, "No catalog IDs for top genres");
        }

        // 3. Popular backfill
        if pool.is_empty() {
            tracing::debug!(user_id = %user_id, "No personalized candidates, using popular movies");
        }

        if pool.len() < BACKFILL_THRESHOLD {
            let result = self.catalog.get_popular().await;
            tally.record(&result);
            match result {
                Ok(popular) => pool.backfill(popular, MAX_RECOMMENDATIONS),
                Err(e) => tracing::warn!(error = %e, "Popular backfill failed"),
            }
        }

        if tally.all_failed() {
            tracing::error!(
                user_id = %user_id,
                attempted = tally.attempted,
                provider = self.catalog.name(),
                "Every catalog lookup failed"
            );
            return Err(AppError::CatalogUnavailable(format!(
                "All {} catalog lookups failed",
                tally.attempted
            )));
        }

        let recommendations = pool.into_ranked(MAX_RECOMMENDATIONS);

        tracing::info!(
            user_id = %user_id,
            reviews = reviews.len(),
            seeds = seeds.len(),
            genres_seen = genre_scores.len(),
            top_genres = ?top_genres,
            top_weights = ?top_weights,
            lookups_failed = tally.attempted - tally.succeeded,
            results = recommendations.len(),
            "Recommendations generated"
        );

        Ok(recommendations)
    }

    /// Fetches similar movies for the strongest seeds in parallel
    ///
    /// Results are concatenated in seed order regardless of completion order;
    /// failed lookups contribute nothing.
    async fn similar_to_seeds(
        &self,
        seeds: &[&Review],
        tally: &mut LookupTally,
    ) -> Vec<CandidateMovie> {
        let tasks: Vec<_> = seeds
            .iter()
            .take(MAX_SIMILAR_LOOKUPS)
            .map(|seed| {
                let catalog = Arc::clone(&self.catalog);
                let movie_id = seed.movie_id;
                let task = tokio::spawn(async move { catalog.get_similar_to(movie_id).await });
                (movie_id, task)
            })
            .collect();

        let mut movies = Vec::new();

        for (movie_id, task) in tasks {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(AppError::Internal(e.to_string())),
            };

            tally.record(&result);
            match result {
                Ok(similar) => movies.extend(similar),
                Err(e) => {
                    tracing::warn!(seed_movie_id = movie_id, error = %e, "Similar-movie lookup failed");
                }
            }
        }

        movies
    }

    /// Tags reviews that have no genres yet with the catalog's genres
    ///
    /// Reviews are processed one at a time. A failure to fetch or persist the
    /// genres of one review is counted and does not stop the run.
    #[instrument(skip(self))]
    pub async fn backfill_genres(&self, user_id: &str) -> AppResult<BackfillReport> {
        let reviews = self.reviews.list_reviews_oldest_first(user_id).await?;
        let mut report = BackfillReport::default();

        for review in reviews.iter().filter(|r| r.missing_genres()) {
            match self.tag_review(review).await {
                Ok(genres) => {
                    tracing::debug!(review_id = review.id, genres, "Genres backfilled");
                    report.updated += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        review_id = review.id,
                        movie_id = review.movie_id,
                        title = %review.title,
                        error = %e,
                        "Failed to backfill genres"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            user_id = %user_id,
            updated = report.updated,
            failed = report.failed,
            "Genre backfill finished"
        );

        Ok(report)
    }

    /// Fetches and stores the genres of one review, returning how many were set
    async fn tag_review(&self, review: &Review) -> AppResult<usize> {
        let genres = self.catalog.get_genres(review.movie_id).await?;
        let count = genres.len();
        self.reviews.set_genres(review.id, genres).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockReviewStore;
    use crate::models::MovieId;
    use crate::services::catalog::MockCatalogService;
    use chrono::{Duration, Utc};
    use mockall::predicate::eq;
    use std::collections::HashSet;

    fn review(movie_id: MovieId, rating: f64, genres: &[&str]) -> Review {
        Review {
            id: movie_id * 10,
            user_id: "alice".to_string(),
            movie_id,
            title: format!("Reviewed {}", movie_id),
            rating,
            review: "seen it".to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            watched_date: Utc::now(),
            created_at: Utc::now() - Duration::minutes(movie_id),
        }
    }

    fn movie(movie_id: MovieId) -> CandidateMovie {
        CandidateMovie {
            movie_id,
            title: format!("Movie {}", movie_id),
            year: Some("2020".to_string()),
            overview: None,
            poster_url: None,
            rating: 7.5,
        }
    }

    fn movies(ids: impl IntoIterator<Item = MovieId>) -> Vec<CandidateMovie> {
        ids.into_iter().map(movie).collect()
    }

    fn ids(movies: &[CandidateMovie]) -> Vec<MovieId> {
        movies.iter().map(|m| m.movie_id).collect()
    }

    fn store_with(reviews: Vec<Review>) -> MockReviewStore {
        let mut store = MockReviewStore::new();
        store
            .expect_list_reviews_oldest_first()
            .returning(move |_| Ok(reviews.clone()));
        store
    }

    fn catalog() -> MockCatalogService {
        let mut catalog = MockCatalogService::new();
        catalog.expect_name().return_const("mock");
        catalog
    }

    fn engine(catalog: MockCatalogService, store: MockReviewStore) -> RecommendationEngine {
        RecommendationEngine::new(Arc::new(catalog), Arc::new(store), GenreMap::default())
    }

    #[tokio::test]
    async fn test_cold_start_returns_popular_verbatim() {
        let popular = movies((1..=25).rev());
        let expected = popular.clone();

        let mut catalog = catalog();
        catalog
            .expect_get_popular()
            .times(1)
            .returning(move || Ok(popular.clone()));
        catalog.expect_get_similar_to().never();
        catalog.expect_discover().never();

        let result = engine(catalog, store_with(vec![]))
            .recommend("alice")
            .await
            .unwrap();

        // Not capped, not reordered
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_cold_start_popular_failure_is_unavailable() {
        let mut catalog = catalog();
        catalog
            .expect_get_popular()
            .returning(|| Err(AppError::ExternalApi("TMDB down".to_string())));

        let result = engine(catalog, store_with(vec![])).recommend("alice").await;

        assert!(matches!(result, Err(AppError::CatalogUnavailable(_))));
    }

    #[tokio::test]
    async fn test_similar_results_in_seed_order_then_discover() {
        let reviews = vec![
            review(1, 7.0, &["Drama"]),
            review(2, 9.0, &["Action"]),
            review(3, 8.0, &["Action"]),
            review(4, 10.0, &[]),
        ];

        let mut catalog = catalog();
        catalog
            .expect_get_similar_to()
            .with(eq(4))
            .returning(|_| Ok(movies([40, 41])));
        catalog
            .expect_get_similar_to()
            .with(eq(2))
            .returning(|_| Ok(movies([20, 21])));
        catalog
            .expect_get_similar_to()
            .with(eq(3))
            .returning(|_| Ok(movies([30, 31, 1])));
        catalog
            .expect_discover()
            .withf(|q| q.genre_ids == vec![28, 18] && q.min_rating == 6.5 && q.sort_by_rating)
            .times(1)
            .returning(|_| Ok(movies(50..=55)));
        catalog.expect_get_popular().never();

        let result = engine(catalog, store_with(reviews))
            .recommend("alice")
            .await
            .unwrap();

        assert_eq!(
            ids(&result),
            vec![40, 41, 20, 21, 30, 31, 50, 51, 52, 53, 54, 55]
        );
    }

    #[tokio::test]
    async fn test_only_top_three_seeds_are_looked_up() {
        let reviews: Vec<Review> = [9.0, 8.0, 7.0, 6.0, 5.0, 4.0]
            .iter()
            .enumerate()
            .map(|(i, &rating)| review(i as MovieId + 1, rating, &[]))
            .collect();

        let mut catalog = catalog();
        for seed in [1, 2, 3] {
            catalog
                .expect_get_similar_to()
                .with(eq(seed))
                .times(1)
                .returning(move |id| Ok(movies([id * 100])));
        }
        catalog
            .expect_get_popular()
            .returning(|| Ok(movies(1000..1030)));
        catalog.expect_discover().never();

        let result = engine(catalog, store_with(reviews))
            .recommend("alice")
            .await
            .unwrap();

        assert_eq!(&ids(&result)[..3], &[100, 200, 300]);
        assert_eq!(result.len(), MAX_RECOMMENDATIONS);
    }

    #[tokio::test]
    async fn test_partial_similar_failure_still_succeeds() {
        let reviews = vec![
            review(1, 9.0, &[]),
            review(2, 8.0, &[]),
            review(3, 7.0, &[]),
        ];

        let mut catalog = catalog();
        catalog
            .expect_get_similar_to()
            .with(eq(1))
            .returning(|_| Ok(movies([11, 12])));
        catalog
            .expect_get_similar_to()
            .with(eq(2))
            .returning(|_| Err(AppError::ExternalApi("timeout".to_string())));
        catalog
            .expect_get_similar_to()
            .with(eq(3))
            .returning(|_| Ok(movies([31])));
        catalog.expect_get_popular().returning(|| Ok(vec![]));

        let result = engine(catalog, store_with(reviews))
            .recommend("alice")
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![11, 12, 31]);
    }

    #[tokio::test]
    async fn test_discover_failure_degrades() {
        let reviews = vec![review(1, 5.0, &["Comedy"])];

        let mut catalog = catalog();
        catalog
            .expect_discover()
            .returning(|_| Err(AppError::ExternalApi("502".to_string())));
        catalog
            .expect_get_popular()
            .returning(|| Ok(movies([1, 2, 3])));

        let result = engine(catalog, store_with(reviews))
            .recommend("alice")
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_total_catalog_failure_is_an_error() {
        let reviews = vec![review(1, 9.0, &["Action"]), review(2, 8.0, &["Drama"])];

        let mut catalog = catalog();
        catalog
            .expect_get_similar_to()
            .returning(|_| Err(AppError::ExternalApi("down".to_string())));
        catalog
            .expect_discover()
            .returning(|_| Err(AppError::ExternalApi("down".to_string())));
        catalog
            .expect_get_popular()
            .returning(|| Err(AppError::ExternalApi("down".to_string())));

        let result = engine(catalog, store_with(reviews)).recommend("alice").await;

        assert!(matches!(result, Err(AppError::CatalogUnavailable(_))));
    }

    #[tokio::test]
    async fn test_unmapped_genres_skip_discover() {
        let reviews = vec![review(1, 6.0, &["TV Movie", "Anime"])];

        let mut catalog = catalog();
        catalog.expect_discover().never();
        catalog
            .expect_get_popular()
            .returning(|| Ok(movies([5, 6])));

        let result = engine(catalog, store_with(reviews))
            .recommend("alice")
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![5, 6]);
    }

    #[tokio::test]
    async fn test_unmapped_genre_still_takes_a_top_slot() {
        // "Anime" outranks Drama, leaving Action and Horror as the only mapped top genres
        let reviews = vec![
            review(1, 6.0, &["Anime", "Action"]),
            review(2, 5.0, &["Anime", "Horror"]),
            review(3, 4.0, &["Drama"]),
        ];

        let mut catalog = catalog();
        catalog
            .expect_discover()
            .withf(|q| q.genre_ids == vec![28, 27])
            .times(1)
            .returning(|_| Ok(movies(100..115)));
        catalog.expect_get_popular().never();

        let result = engine(catalog, store_with(reviews))
            .recommend("alice")
            .await
            .unwrap();

        assert_eq!(result.len(), 15);
    }

    #[tokio::test]
    async fn test_no_backfill_when_enough_candidates() {
        let reviews = vec![review(1, 9.0, &[])];

        let mut catalog = catalog();
        catalog
            .expect_get_similar_to()
            .returning(|_| Ok(movies(10..20)));
        catalog.expect_get_popular().never();

        let result = engine(catalog, store_with(reviews))
            .recommend("alice")
            .await
            .unwrap();

        assert_eq!(result.len(), 10);
    }

    #[tokio::test]
    async fn test_backfill_from_popular_skips_seen_and_reviewed() {
        let reviews = vec![review(1, 9.0, &[]), review(2, 3.0, &[])];

        let mut catalog = catalog();
        catalog
            .expect_get_similar_to()
            .returning(|_| Ok(movies([10, 11])));
        catalog
            .expect_get_popular()
            .returning(|| Ok(movies([2, 10, 12, 1, 13])));

        let result = engine(catalog, store_with(reviews))
            .recommend("alice")
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![10, 11, 12, 13]);
    }

    #[tokio::test]
    async fn test_output_invariants_with_overlapping_sources() {
        let reviews: Vec<Review> = (1..=8)
            .map(|id| review(id, 10.0 - id as f64 * 0.5, &["Action", "Thriller"]))
            .collect();
        let reviewed: HashSet<MovieId> = reviews.iter().map(|r| r.movie_id).collect();

        let mut catalog = catalog();
        catalog
            .expect_get_similar_to()
            .returning(|id| Ok(movies((id..id + 12).chain(1..=3))));
        catalog
            .expect_discover()
            .returning(|_| Ok(movies((5..60).step_by(2))));

        let result = engine(catalog, store_with(reviews))
            .recommend("alice")
            .await
            .unwrap();

        let unique: HashSet<MovieId> = result.iter().map(|m| m.movie_id).collect();
        assert_eq!(result.len(), MAX_RECOMMENDATIONS);
        assert_eq!(unique.len(), result.len());
        assert!(unique.is_disjoint(&reviewed));
    }

    #[tokio::test]
    async fn test_equal_ratings_follow_write_order() {
        let store = crate::db::MemoryReviewStore::new();
        for (movie_id, genre) in [
            (1, "Western"),
            (2, "Horror"),
            (3, "Mystery"),
            (4, "Crime"),
            (5, "Drama"),
        ] {
            let new_review = crate::models::NewReview {
                movie_id,
                title: format!("Reviewed {}", movie_id),
                rating: 8.0,
                review: "seen it".to_string(),
                watched_date: None,
            };
            store
                .create_review("alice", new_review, vec![genre.to_string()])
                .await
                .unwrap();
        }

        let mut catalog = catalog();
        for seed in [1, 2, 3] {
            catalog
                .expect_get_similar_to()
                .with(eq(seed))
                .times(1)
                .returning(|id| Ok(movies([id * 100])));
        }
        catalog
            .expect_discover()
            .withf(|q| q.genre_ids == vec![37, 27, 9648])
            .times(1)
            .returning(|_| Ok(movies(500..510)));
        catalog.expect_get_popular().never();

        let engine = RecommendationEngine::new(
            Arc::new(catalog),
            Arc::new(store),
            GenreMap::default(),
        );
        let result = engine.recommend("alice").await.unwrap();

        assert_eq!(&ids(&result)[..3], &[100, 200, 300]);
        assert_eq!(result.len(), 13);
    }

    #[tokio::test]
    async fn test_review_store_failure_propagates() {
        let mut store = MockReviewStore::new();
        store
            .expect_list_reviews_oldest_first()
            .returning(|_| Err(AppError::Internal("store offline".to_string())));

        let result = engine(catalog(), store).recommend("alice").await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_backfill_counts_updates_and_failures() {
        let reviews = vec![
            review(1, 8.0, &[]),
            review(2, 6.0, &["Drama"]),
            review(3, 7.0, &[]),
            review(4, 5.0, &[]),
        ];

        let mut catalog = catalog();
        catalog
            .expect_get_genres()
            .with(eq(1))
            .returning(|_| Ok(vec!["Action".to_string()]));
        catalog
            .expect_get_genres()
            .with(eq(3))
            .returning(|_| Err(AppError::ExternalApi("404".to_string())));
        catalog
            .expect_get_genres()
            .with(eq(4))
            .returning(|_| Ok(vec!["Comedy".to_string(), "Romance".to_string()]));
        catalog.expect_get_genres().with(eq(2)).never();

        let mut store = store_with(reviews);
        store
            .expect_set_genres()
            .withf(|id, genres| *id == 10 && genres == &vec!["Action".to_string()])
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_set_genres()
            .withf(|id, _| *id == 40)
            .times(1)
            .returning(|_, _| Ok(()));

        let report = engine(catalog, store)
            .backfill_genres("alice")
            .await
            .unwrap();

        assert_eq!(report, BackfillReport { updated: 2, failed: 1 });
    }

    #[tokio::test]
    async fn test_backfill_persist_failure_counts_as_failed() {
        let reviews = vec![review(1, 8.0, &[]), review(2, 8.0, &[])];

        let mut catalog = catalog();
        catalog
            .expect_get_genres()
            .returning(|_| Ok(vec!["Drama".to_string()]));

        let mut store = store_with(reviews);
        store
            .expect_set_genres()
            .withf(|id, _| *id == 10)
            .returning(|_, _| Err(AppError::NotFound("gone".to_string())));
        store
            .expect_set_genres()
            .withf(|id, _| *id == 20)
            .returning(|_, _| Ok(()));

        let report = engine(catalog, store)
            .backfill_genres("alice")
            .await
            .unwrap();

        assert_eq!(report, BackfillReport { updated: 1, failed: 1 });
    }

    #[tokio::test]
    async fn test_backfill_nothing_to_do() {
        let reviews = vec![review(1, 8.0, &["Drama"])];

        let mut catalog = catalog();
        catalog.expect_get_genres().never();

        let report = engine(catalog, store_with(reviews))
            .backfill_genres("alice")
            .await
            .unwrap();

        assert!(report.is_noop());
    }
}
