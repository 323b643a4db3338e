//! Static TMDb genre vocabularies.
//!
//! TMDb identifies genres by numeric id while users pick them by display name.
//! Movie and TV genres are separate lists upstream, so each gets its own table.

use std::collections::HashSet;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Genre {
    pub id: i64,
    pub name: &'static str,
}

const fn genre(id: i64, name: &'static str) -> Genre {
    Genre { id, name }
}

/// A fixed name→id table, matched case-insensitively
#[derive(Debug)]
pub struct GenreVocabulary {
    genres: &'static [Genre],
}

pub static MOVIE_GENRES: GenreVocabulary = GenreVocabulary {
    genres: &[
        genre(28, "Action"),
        genre(12, "Adventure"),
        genre(16, "Animation"),
        genre(35, "Comedy"),
        genre(80, "Crime"),
        genre(99, "Documentary"),
        genre(18, "Drama"),
        genre(10751, "Family"),
        genre(14, "Fantasy"),
        genre(36, "History"),
        genre(27, "Horror"),
        genre(10402, "Music"),
        genre(9648, "Mystery"),
        genre(10749, "Romance"),
        genre(878, "Science Fiction"),
        genre(10770, "TV Movie"),
        genre(53, "Thriller"),
        genre(10752, "War"),
        genre(37, "Western"),
    ],
};

pub static TV_GENRES: GenreVocabulary = GenreVocabulary {
    genres: &[
        genre(10759, "Action & Adventure"),
        genre(16, "Animation"),
        genre(35, "Comedy"),
        genre(80, "Crime"),
        genre(99, "Documentary"),
        genre(18, "Drama"),
        genre(10751, "Family"),
        genre(10762, "Kids"),
        genre(9648, "Mystery"),
        genre(10763, "News"),
        genre(10764, "Reality"),
        genre(10765, "Sci-Fi & Fantasy"),
        genre(10766, "Soap"),
        genre(10767, "Talk"),
        genre(10768, "War & Politics"),
        genre(37, "Western"),
    ],
};

/// Result of validating a requested list of genre names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenreUpdate {
    /// Canonical names, first-seen order, no duplicates
    pub saved: Vec<String>,
    /// Requested names that are not in the vocabulary, as given
    pub invalid: Vec<String>,
}

impl GenreVocabulary {
    /// Finds a genre by display name, ignoring case and surrounding whitespace
    pub fn lookup(&self, name: &str) -> Option<&'static Genre> {
        let name = name.trim();
        self.genres
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
    }

    /// Resolves names to ids. Unknown names are dropped.
    pub fn resolve_ids<S: AsRef<str>>(&self, names: &[S]) -> HashSet<i64> {
        names
            .iter()
            .filter_map(|name| self.lookup(name.as_ref()))
            .map(|g| g.id)
            .collect()
    }

    /// Splits requested names into canonical valid names and invalid leftovers
    pub fn canonicalize<S: AsRef<str>>(&self, names: &[S]) -> GenreUpdate {
        let mut update = GenreUpdate::default();

        for name in names {
            let name = name.as_ref();
            match self.lookup(name) {
                Some(g) => {
                    if !update.saved.iter().any(|saved| saved == g.name) {
                        update.saved.push(g.name.to_string());
                    }
                }
                None => update.invalid.push(name.to_string()),
            }
        }

        update
    }
}
