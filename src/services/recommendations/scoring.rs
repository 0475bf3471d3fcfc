//! Pure building blocks of the recommendation pipeline.
//!
//! Nothing here touches the catalog or the review store, so each step can be
//! tested on plain data.

use std::collections::{HashMap, HashSet};

use crate::models::{CandidateMovie, MovieId, Review};

/// Picks the reviews used to source "similar movie" suggestions
///
/// Keeps reviews rated at least `min_rating`, highest first. Equal ratings keep
/// their original relative order.
pub fn select_seeds(reviews: &[Review], min_rating: f64, limit: usize) -> Vec<&Review> {
    let mut seeds: Vec<&Review> = reviews.iter().filter(|r| r.rating >= min_rating).collect();

    // sort_by is stable
    seeds.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    seeds.truncate(limit);
    seeds
}

/// Accumulated rating mass per genre, in first-encountered order
///
/// Built fresh for every request.
#[derive(Debug, Default)]
pub struct GenreScore {
    weights: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl GenreScore {
    /// Adds each review's rating to every genre it is tagged with
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut score = Self::default();
        for review in reviews {
            for genre in &review.genres {
                score.add(genre, review.rating);
            }
        }
        score
    }

    pub fn add(&mut self, genre: &str, weight: f64) {
        match self.index.get(genre) {
            Some(&i) => self.weights[i].1 += weight,
            None => {
                self.index.insert(genre.to_string(), self.weights.len());
                self.weights.push((genre.to_string(), weight));
            }
        }
    }

    pub fn weight(&self, genre: &str) -> Option<f64> {
        self.index.get(genre).map(|&i| self.weights[i].1)
    }

    /// The `n` heaviest genres, ties broken by first-encountered order
    pub fn top(&self, n: usize) -> Vec<&str> {
        let mut ranked: Vec<&(String, f64)> = self.weights.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        ranked
            .into_iter()
            .take(n)
            .map(|(genre, _)| genre.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Ordered, deduplicated candidate list
///
/// The first occurrence of a movie wins, and movies the user already reviewed
/// are never admitted.
#[derive(Debug)]
pub struct CandidatePool {
    movies: Vec<CandidateMovie>,
    seen: HashSet<MovieId>,
    reviewed: HashSet<MovieId>,
}

impl CandidatePool {
    pub fn new(reviewed: impl IntoIterator<Item = MovieId>) -> Self {
        Self {
            movies: Vec::new(),
            seen: HashSet::new(),
            reviewed: reviewed.into_iter().collect(),
        }
    }

    /// Adds a movie unless it is a duplicate or already reviewed
    pub fn push(&mut self, movie: CandidateMovie) -> bool {
        if self.reviewed.contains(&movie.movie_id) || !self.seen.insert(movie.movie_id) {
            return false;
        }
        self.movies.push(movie);
        true
    }

    pub fn extend(&mut self, movies: impl IntoIterator<Item = CandidateMovie>) {
        for movie in movies {
            self.push(movie);
        }
    }

    /// Tops the pool up from `movies` in order until it holds `limit` entries
    pub fn backfill(&mut self, movies: impl IntoIterator<Item = CandidateMovie>, limit: usize) {
        for movie in movies {
            if self.movies.len() >= limit {
                break;
            }
            self.push(movie);
        }
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// The first `limit` candidates in admission order
    pub fn into_ranked(mut self, limit: usize) -> Vec<CandidateMovie> {
        self.movies.truncate(limit);
        self.movies
    }
}
