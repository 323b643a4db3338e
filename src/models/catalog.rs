use serde::{Deserialize, Serialize};

use super::genre::{GenreVocabulary, MOVIE_GENRES, TV_GENRES};

/// Placeholder for missing titles, names and dates
pub const UNKNOWN: &str = "Unknown";

/// Placeholder for missing overviews
pub const NO_DESCRIPTION: &str = "No description available.";

/// Which half of the catalog a lookup targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    /// Path segment used by TMDb for this kind
    pub fn path_segment(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    pub fn genres(self) -> &'static GenreVocabulary {
        match self {
            MediaKind::Movie => &MOVIE_GENRES,
            MediaKind::Tv => &TV_GENRES,
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            MediaKind::Movie => "movies",
            MediaKind::Tv => "TV shows",
        }
    }
}

/// A movie or TV show flattened onto one schema
///
/// TV shows carry their `name` in `title` and their `first_air_date` in
/// `release_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub release_date: String,
    pub poster_path: Option<String>,
    pub rating: f64,
    pub genre_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub id: i64,
    pub name: String,
    pub known_for_department: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    pub character: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: i64,
    pub name: String,
    pub job: String,
    pub department: String,
    pub profile_path: Option<String>,
}

/// Cast and crew of one movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieCredits {
    pub id: i64,
    pub title: String,
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
}

/// Movies a person appeared in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonFilmography {
    pub id: i64,
    pub name: String,
    pub profile_path: Option<String>,
    pub movies: Vec<CatalogItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchProvider {
    pub provider_id: i64,
    pub provider_name: String,
    pub logo_path: Option<String>,
}

/// Where a title can be watched in one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchAvailability {
    pub id: i64,
    pub title: String,
    pub region: String,
    pub link: Option<String>,
    pub flatrate: Vec<WatchProvider>,
    pub rent: Vec<WatchProvider>,
    pub buy: Vec<WatchProvider>,
}

impl WatchAvailability {
    pub fn is_empty(&self) -> bool {
        self.flatrate.is_empty() && self.rent.is_empty() && self.buy.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_serialization() {
        assert_eq!(serde_json::to_string(&MediaKind::Tv).unwrap(), "\"tv\"");
        assert_eq!(MediaKind::Movie.path_segment(), "movie");
    }

    #[test]
    fn test_media_kind_picks_vocabulary() {
        assert!(MediaKind::Tv.genres().lookup("Kids").is_some());
        assert!(MediaKind::Movie.genres().lookup("Kids").is_none());
    }
}
