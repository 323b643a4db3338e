use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

/// User-owned collections keyed by an upstream entity id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    FavoriteMovies,
    FavoriteActors,
    Watchlist,
}

/// Table and column names backing a collection
///
/// Column names double as the JSON field names in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSchema {
    pub table: &'static str,
    pub id_column: &'static str,
    pub name_column: &'static str,
    pub image_column: &'static str,
}

impl Collection {
    pub fn schema(self) -> CollectionSchema {
        match self {
            Collection::FavoriteMovies => CollectionSchema {
                table: "favorite_movies",
                id_column: "movie_id",
                name_column: "movie_title",
                image_column: "poster_path",
            },
            Collection::FavoriteActors => CollectionSchema {
                table: "favorite_actors",
                id_column: "actor_id",
                name_column: "actor_name",
                image_column: "profile_path",
            },
            Collection::Watchlist => CollectionSchema {
                table: "movie_watchlist",
                id_column: "movie_id",
                name_column: "movie_title",
                image_column: "poster_path",
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Collection::FavoriteMovies => "favorite movies",
            Collection::FavoriteActors => "favorite actors",
            Collection::Watchlist => "watchlist",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCollectionItem {
    pub external_id: i64,
    pub display_name: String,
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CollectionItem {
    pub external_id: i64,
    pub display_name: String,
    pub image_path: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl CollectionItem {
    /// Renders the item with the collection's own field names
    pub fn to_json(&self, collection: Collection) -> Value {
        let schema = collection.schema();
        let mut map = serde_json::Map::new();
        map.insert(schema.id_column.to_string(), json!(self.external_id));
        map.insert(schema.name_column.to_string(), json!(self.display_name));
        map.insert(schema.image_column.to_string(), json!(self.image_path));
        map.insert("added_at".to_string(), json!(self.added_at));
        Value::Object(map)
    }
}

/// Outcome of a get-or-create
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<T> {
    pub record: T,
    pub created: bool,
}

/// Like/dislike choice used by both feedback entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Like,
    Dislike,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Like => "like",
            Verdict::Dislike => "dislike",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Like => "Like",
            Verdict::Dislike => "Dislike",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct InvalidChoice(pub String);

impl FromStr for Verdict {
    type Err = InvalidChoice;

    /// Accepts `like`/`dislike` in any case, and the legacy `1`/`0` codes
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" | "1" => Ok(Verdict::Like),
            "dislike" | "0" => Ok(Verdict::Dislike),
            _ => Err(InvalidChoice(s.to_string())),
        }
    }
}

/// The two append-only search logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Movie,
    Tv,
}

impl SearchKind {
    /// Table and title column of the log
    pub fn schema(self) -> (&'static str, &'static str) {
        match self {
            SearchKind::Movie => ("recent_searches", "movie_title"),
            SearchKind::Tv => ("recent_tv_show_searches", "tv_show_title"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RecentSearch {
    pub title: String,
    pub searched_at: DateTime<Utc>,
}

impl RecentSearch {
    pub fn to_json(&self, kind: SearchKind) -> Value {
        let (_, column) = kind.schema();
        let mut map = serde_json::Map::new();
        map.insert(column.to_string(), json!(self.title));
        map.insert("searched_at".to_string(), json!(self.searched_at));
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMovieFeedback {
    pub movie_title: String,
    pub rating: Verdict,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieFeedback {
    pub id: i64,
    pub movie_title: String,
    pub rating: Verdict,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Feedback on one recommendation; immutable once written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationFeedback {
    pub movie_id: i64,
    pub recommended_movie_id: i64,
    pub feedback: Verdict,
    pub created_at: DateTime<Utc>,
}

/// A saved TV recommendation
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RecommendationLink {
    pub tvshow_id: i64,
    pub recommended_tv_show_id: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_parsing() {
        assert_eq!("like".parse::<Verdict>(), Ok(Verdict::Like));
        assert_eq!(" DISLIKE ".parse::<Verdict>(), Ok(Verdict::Dislike));
        assert_eq!("1".parse::<Verdict>(), Ok(Verdict::Like));
        assert_eq!("0".parse::<Verdict>(), Ok(Verdict::Dislike));
        assert_eq!(
            "meh".parse::<Verdict>().unwrap_err().to_string(),
            "\"meh\" is not a valid choice."
        );
    }

    #[test]
    fn test_collection_item_uses_collection_field_names() {
        let item = CollectionItem {
            external_id: 287,
            display_name: "Brad Pitt".to_string(),
            image_path: None,
            added_at: Utc::now(),
        };

        let value = item.to_json(Collection::FavoriteActors);
        assert_eq!(value["actor_id"], 287);
        assert_eq!(value["actor_name"], "Brad Pitt");
        assert!(value["profile_path"].is_null());

        let value = item.to_json(Collection::Watchlist);
        assert_eq!(value["movie_id"], 287);
        assert_eq!(value["movie_title"], "Brad Pitt");
    }

    #[test]
    fn test_recent_search_field_name_follows_kind() {
        let search = RecentSearch {
            title: "Dark".to_string(),
            searched_at: Utc::now(),
        };
        assert_eq!(search.to_json(SearchKind::Tv)["tv_show_title"], "Dark");
        assert_eq!(search.to_json(SearchKind::Movie)["movie_title"], "Dark");
    }
}
