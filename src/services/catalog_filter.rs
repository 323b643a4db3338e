use std::collections::HashSet;

use crate::models::{CatalogItem, GenreVocabulary};

/// Genre, rating and release-year constraints applied to upstream lists
///
/// Genre names are resolved to ids once, at construction. Unknown names are
/// dropped, so a filter built only from unknown names matches nothing.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// `None` when no genres were requested
    genre_ids: Option<HashSet<i64>>,
    min_rating: Option<f64>,
    release_year: Option<i32>,
}

/// Result of filtering a list
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    Matches(Vec<CatalogItem>),
    NoMatches,
}

impl FilterOutcome {
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        if items.is_empty() {
            FilterOutcome::NoMatches
        } else {
            FilterOutcome::Matches(items)
        }
    }
}

impl CatalogFilter {
    pub fn new<S: AsRef<str>>(
        genres: &[S],
        min_rating: Option<f64>,
        release_year: Option<i32>,
        vocabulary: &GenreVocabulary,
    ) -> Self {
        let genre_ids = if genres.is_empty() {
            None
        } else {
            Some(vocabulary.resolve_ids(genres))
        };

        Self {
            genre_ids,
            min_rating,
            release_year,
        }
    }

    /// True when no constraint was given, so every item matches
    pub fn is_unconstrained(&self) -> bool {
        self.genre_ids.is_none() && self.min_rating.is_none() && self.release_year.is_none()
    }

    pub fn matches(&self, item: &CatalogItem) -> bool {
        self.matches_genre(item) && self.matches_rating(item) && self.matches_year(item)
    }

    fn matches_genre(&self, item: &CatalogItem) -> bool {
        match &self.genre_ids {
            None => true,
            Some(ids) => item.genre_ids.iter().any(|id| ids.contains(id)),
        }
    }

    fn matches_rating(&self, item: &CatalogItem) -> bool {
        self.min_rating.map_or(true, |min| item.rating >= min)
    }

    fn matches_year(&self, item: &CatalogItem) -> bool {
        self.release_year
            .map_or(true, |year| item.release_date.starts_with(&year.to_string()))
    }
}

/// Lazily yields the items that satisfy `filter`, in input order
pub fn filter_catalog<'a, I>(
    items: I,
    filter: &'a CatalogFilter,
) -> impl Iterator<Item = CatalogItem> + 'a
where
    I: IntoIterator<Item = CatalogItem>,
    I::IntoIter: 'a,
{
    items.into_iter().filter(move |item| filter.matches(item))
}

/// Filters and collects, distinguishing an empty result
pub fn apply_filter(items: Vec<CatalogItem>, filter: &CatalogFilter) -> FilterOutcome {
    if filter.is_unconstrained() {
        return FilterOutcome::from_items(items);
    }
    FilterOutcome::from_items(filter_catalog(items, filter).collect())
}
