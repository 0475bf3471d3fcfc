use serde::{Deserialize, Serialize};

pub mod review;

pub use review::{BackfillReport, NewReview, Review, ReviewUpdate};

/// Catalog identifier of a movie (TMDB ID)
pub type MovieId = i64;

/// A movie suggested to the user, as returned by the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateMovie {
    pub movie_id: MovieId,
    pub title: String,
    /// Release year, when the catalog knows the release date
    pub year: Option<String>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    /// Catalog average rating (0-10)
    pub rating: f64,
}

impl CandidateMovie {
    /// Converts a raw TMDB movie, resolving the poster path against `image_base`
    pub fn from_tmdb(movie: TmdbMovie, image_base: &str) -> Self {
        let year = movie
            .release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .map(str::to_string);

        Self {
            movie_id: movie.id,
            title: movie.title,
            year,
            overview: movie.overview.filter(|o| !o.is_empty()),
            poster_url: movie
                .poster_path
                .map(|path| format!("{}{}", image_base, path)),
            rating: movie.vote_average.unwrap_or(0.0),
        }
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Movie entry in TMDB list responses (popular, recommendations, discover)
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

/// Paged TMDB list response
#[derive(Debug, Deserialize)]
pub struct TmdbPage {
    pub results: Vec<TmdbMovie>,
}

/// Subset of GET /movie/{id} used for genre tagging
#[derive(Debug, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: MovieId,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

/// Genre entry of a movie; only the name is stored on reviews
#[derive(Debug, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}
