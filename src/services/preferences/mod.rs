/// Per-user persistence
///
/// Two backends implement these traits: [`PgStore`] over PostgreSQL and
/// [`MemoryStore`] for running without a database. Get-or-create and
/// insert-once semantics are enforced by each backend in a single step, never by
/// a read followed by a separate write.
use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Collection, CollectionItem, GenreUpdate, MovieFeedback, NewCollectionItem,
        NewMovieFeedback, RecentSearch, RecommendationFeedback, RecommendationLink, SearchKind,
        Upserted, UserRecord, Verdict, TV_GENRES,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// How many recent searches the listing endpoints return
pub const RECENT_SEARCH_LIMIT: i64 = 20;

pub(crate) const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub(crate) const FEEDBACK_EXISTS: &str = "Feedback for this recommendation already exists.";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the username is taken
    async fn create_user(&self, username: &str, password_hash: &str) -> AppResult<UserRecord>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserRecord>>;

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>>;
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Creates the entry if absent, otherwise returns the stored one unchanged
    async fn upsert_collection_item(
        &self,
        user: Uuid,
        collection: Collection,
        item: NewCollectionItem,
    ) -> AppResult<Upserted<CollectionItem>>;

    /// Newest first
    async fn list_collection(
        &self,
        user: Uuid,
        collection: Collection,
    ) -> AppResult<Vec<CollectionItem>>;

    /// Returns whether an entry was removed
    async fn remove_collection_item(
        &self,
        user: Uuid,
        collection: Collection,
        external_id: i64,
    ) -> AppResult<bool>;

    async fn record_search(
        &self,
        user: Uuid,
        kind: SearchKind,
        title: &str,
    ) -> AppResult<RecentSearch>;

    /// Newest first, at most `limit`
    async fn recent_searches(
        &self,
        user: Uuid,
        kind: SearchKind,
        limit: i64,
    ) -> AppResult<Vec<RecentSearch>>;

    /// Returns the number of rows deleted
    async fn clear_searches(&self, user: Uuid, kind: SearchKind) -> AppResult<u64>;

    async fn record_movie_feedback(
        &self,
        user: Uuid,
        feedback: NewMovieFeedback,
    ) -> AppResult<MovieFeedback>;

    /// Insert-once; any repeat of the (user, movie, recommendation) triple is a
    /// `Conflict`, whatever the verdict
    async fn record_recommendation_feedback(
        &self,
        user: Uuid,
        movie_id: i64,
        recommended_movie_id: i64,
        feedback: Verdict,
    ) -> AppResult<RecommendationFeedback>;

    /// Get-or-create; repeats return the first record
    async fn upsert_recommendation_link(
        &self,
        user: Uuid,
        tvshow_id: i64,
        recommended_tv_show_id: i64,
    ) -> AppResult<Upserted<RecommendationLink>>;

    /// Empty when the user never saved preferences
    async fn preferred_genres(&self, user: Uuid) -> AppResult<Vec<String>>;

    /// Overwrites the stored list with `genres` as given
    async fn store_preferred_genres(&self, user: Uuid, genres: &[String]) -> AppResult<()>;

    /// Canonicalizes `requested` against the TV vocabulary and persists the valid
    /// subset as the complete new set
    async fn replace_preferred_genres(
        &self,
        user: Uuid,
        requested: &[String],
    ) -> AppResult<GenreUpdate> {
        let update = TV_GENRES.canonicalize(requested);
        self.store_preferred_genres(user, &update.saved).await?;

        tracing::info!(
            user_id = %user,
            saved = update.saved.len(),
            invalid = update.invalid.len(),
            "Replaced TV genre preferences"
        );

        Ok(update)
    }
}

/// Everything the HTTP layer needs from persistence
pub trait Store: UserStore + PreferenceStore {}

impl<T: UserStore + PreferenceStore + ?Sized> Store for T {}
