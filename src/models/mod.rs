pub mod account;
pub mod catalog;
pub mod genre;
pub mod preferences;

pub use account::{UserProfile, UserRecord};
pub use catalog::{
    CastMember, CatalogItem, CrewMember, MediaKind, MovieCredits, PersonFilmography,
    PersonSummary, WatchAvailability, WatchProvider, NO_DESCRIPTION, UNKNOWN,
};
pub use genre::{Genre, GenreUpdate, GenreVocabulary, MOVIE_GENRES, TV_GENRES};
pub use preferences::{
    Collection, CollectionItem, InvalidChoice, MovieFeedback, NewCollectionItem, NewMovieFeedback,
    RecentSearch, RecommendationFeedback, RecommendationLink, SearchKind, Upserted, Verdict,
};
