/// Metadata provider abstraction
///
/// Handlers depend on the [`MetadataProvider`] trait rather than a concrete client,
/// so the upstream catalog can be swapped (or mocked in tests). Every lookup
/// returns a normalized record or a tagged [`UpstreamError`]; nothing panics across
/// the handler boundary.
use crate::models::{
    CatalogItem, MediaKind, MovieCredits, PersonFilmography, PersonSummary, WatchAvailability,
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Failure talking to the upstream catalog
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpstreamError {
    /// The request never produced a response
    #[error("Error connecting to TMDb API: {0}")]
    Transport(String),

    /// Non-2xx answer other than 404
    #[error("TMDb API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Not found upstream: {0}")]
    NotFound(String),

    /// A 2xx answer whose body did not match the expected shape
    #[error("Unexpected TMDb response: {0}")]
    Decode(String),
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Read-only access to a movie/TV metadata catalog
///
/// Lists are first-page only.
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Search titles by free text
    async fn search(&self, kind: MediaKind, query: &str) -> UpstreamResult<Vec<CatalogItem>>;

    /// Titles trending this week
    async fn trending(&self, kind: MediaKind) -> UpstreamResult<Vec<CatalogItem>>;

    /// Highest-rated titles
    async fn top_rated(&self, kind: MediaKind) -> UpstreamResult<Vec<CatalogItem>>;

    /// Titles recommended for the given title
    async fn recommendations(&self, kind: MediaKind, id: i64)
        -> UpstreamResult<Vec<CatalogItem>>;

    /// Search people by name
    async fn search_people(&self, query: &str) -> UpstreamResult<Vec<PersonSummary>>;

    /// A person together with the movies they acted in
    async fn person_movies(&self, person_id: i64) -> UpstreamResult<PersonFilmography>;

    /// A movie title together with its cast and crew
    async fn movie_credits(&self, movie_id: i64) -> UpstreamResult<MovieCredits>;

    /// A title together with where it streams, rents and sells in `region`
    async fn watch_providers(
        &self,
        kind: MediaKind,
        id: i64,
        region: &str,
    ) -> UpstreamResult<WatchAvailability>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
