use std::collections::HashMap;
use std::path::Path;

/// TMDB movie genre vocabulary
const TMDB_GENRES: &[(&str, i64)] = &[
    ("Action", 28),
    ("Adventure", 12),
    ("Animation", 16),
    ("Comedy", 35),
    ("Crime", 80),
    ("Documentary", 99),
    ("Drama", 18),
    ("Family", 10751),
    ("Fantasy", 14),
    ("History", 36),
    ("Horror", 27),
    ("Music", 10402),
    ("Mystery", 9648),
    ("Romance", 10749),
    ("Science Fiction", 878),
    ("Thriller", 53),
    ("War", 10752),
    ("Western", 37),
];

/// Mapping from genre names (as stored on reviews) to catalog genre IDs
///
/// Names are matched exactly, including case.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreMap {
    ids: HashMap<String, i64>,
}

impl Default for GenreMap {
    fn default() -> Self {
        Self::from_pairs(TMDB_GENRES.iter().map(|(name, id)| (name.to_string(), *id)))
    }
}

impl GenreMap {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, i64)>) -> Self {
        Self {
            ids: pairs.into_iter().collect(),
        }
    }

    /// Loads a JSON object of `{"Genre Name": id}` pairs
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read genre map {}: {}", path.display(), e))?;
        let ids: HashMap<String, i64> = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid genre map {}: {}", path.display(), e))?;

        tracing::info!(path = %path.display(), genres = ids.len(), "Loaded genre map");

        Ok(Self { ids })
    }

    pub fn id_for(&self, genre: &str) -> Option<i64> {
        self.ids.get(genre).copied()
    }

    /// Maps genre names to IDs in order, silently dropping unknown names
    pub fn ids_for<'a>(&self, genres: impl IntoIterator<Item = &'a str>) -> Vec<i64> {
        genres
            .into_iter()
            .filter_map(|genre| self.id_for(genre))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
