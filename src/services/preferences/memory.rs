use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PreferenceStore, UserStore, FEEDBACK_EXISTS, USERNAME_TAKEN};
use crate::{
    error::{AppError, AppResult},
    models::{
        Collection, CollectionItem, MovieFeedback, NewCollectionItem, NewMovieFeedback,
        RecentSearch, RecommendationFeedback, RecommendationLink, SearchKind, Upserted,
        UserRecord, Verdict,
    },
};

type Triple = (Uuid, i64, i64);

/// Process-local store
///
/// Every check-and-insert runs under one write lock, which gives the same
/// uniqueness guarantees as the database constraints.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: HashMap<Uuid, UserRecord>,
    /// Insertion order, oldest first
    collections: HashMap<(Uuid, Collection), Vec<CollectionItem>>,
    searches: HashMap<(Uuid, SearchKind), Vec<RecentSearch>>,
    movie_feedback: Vec<(Uuid, MovieFeedback)>,
    recommendation_feedback: HashMap<Triple, RecommendationFeedback>,
    recommendation_links: HashMap<Triple, RecommendationLink>,
    preferred_genres: HashMap<Uuid, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> AppResult<UserRecord> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.username == username) {
            return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn upsert_collection_item(
        &self,
        user: Uuid,
        collection: Collection,
        item: NewCollectionItem,
    ) -> AppResult<Upserted<CollectionItem>> {
        let mut inner = self.inner.write().await;
        let entries = inner.collections.entry((user, collection)).or_default();

        if let Some(existing) = entries.iter().find(|e| e.external_id == item.external_id) {
            return Ok(Upserted {
                record: existing.clone(),
                created: false,
            });
        }

        let record = CollectionItem {
            external_id: item.external_id,
            display_name: item.display_name,
            image_path: item.image_path,
            added_at: Utc::now(),
        };
        entries.push(record.clone());

        Ok(Upserted {
            record,
            created: true,
        })
    }

    async fn list_collection(
        &self,
        user: Uuid,
        collection: Collection,
    ) -> AppResult<Vec<CollectionItem>> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(&(user, collection))
            .map(|entries| entries.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn remove_collection_item(
        &self,
        user: Uuid,
        collection: Collection,
        external_id: i64,
    ) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let Some(entries) = inner.collections.get_mut(&(user, collection)) else {
            return Ok(false);
        };

        let before = entries.len();
        entries.retain(|e| e.external_id != external_id);
        Ok(entries.len() != before)
    }

    async fn record_search(
        &self,
        user: Uuid,
        kind: SearchKind,
        title: &str,
    ) -> AppResult<RecentSearch> {
        let search = RecentSearch {
            title: title.to_string(),
            searched_at: Utc::now(),
        };

        let mut inner = self.inner.write().await;
        inner
            .searches
            .entry((user, kind))
            .or_default()
            .push(search.clone());

        Ok(search)
    }

    async fn recent_searches(
        &self,
        user: Uuid,
        kind: SearchKind,
        limit: i64,
    ) -> AppResult<Vec<RecentSearch>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let inner = self.inner.read().await;

        Ok(inner
            .searches
            .get(&(user, kind))
            .map(|entries| entries.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn clear_searches(&self, user: Uuid, kind: SearchKind) -> AppResult<u64> {
        let mut inner = self.inner.write().await;
        let removed = inner
            .searches
            .remove(&(user, kind))
            .map_or(0, |entries| entries.len());

        Ok(removed as u64)
    }

    async fn record_movie_feedback(
        &self,
        user: Uuid,
        feedback: NewMovieFeedback,
    ) -> AppResult<MovieFeedback> {
        let mut inner = self.inner.write().await;

        let record = MovieFeedback {
            id: inner.movie_feedback.len() as i64 + 1,
            movie_title: feedback.movie_title,
            rating: feedback.rating,
            comment: feedback.comment,
            created_at: Utc::now(),
        };
        inner.movie_feedback.push((user, record.clone()));

        Ok(record)
    }

    async fn record_recommendation_feedback(
        &self,
        user: Uuid,
        movie_id: i64,
        recommended_movie_id: i64,
        feedback: Verdict,
    ) -> AppResult<RecommendationFeedback> {
        let mut inner = self.inner.write().await;
        let key = (user, movie_id, recommended_movie_id);

        if inner.recommendation_feedback.contains_key(&key) {
            return Err(AppError::Conflict(FEEDBACK_EXISTS.to_string()));
        }

        let record = RecommendationFeedback {
            movie_id,
            recommended_movie_id,
            feedback,
            created_at: Utc::now(),
        };
        inner.recommendation_feedback.insert(key, record.clone());

        Ok(record)
    }

    async fn upsert_recommendation_link(
        &self,
        user: Uuid,
        tvshow_id: i64,
        recommended_tv_show_id: i64,
    ) -> AppResult<Upserted<RecommendationLink>> {
        let mut inner = self.inner.write().await;
        let key = (user, tvshow_id, recommended_tv_show_id);

        if let Some(existing) = inner.recommendation_links.get(&key) {
            return Ok(Upserted {
                record: existing.clone(),
                created: false,
            });
        }

        let record = RecommendationLink {
            tvshow_id,
            recommended_tv_show_id,
            created_at: Utc::now(),
        };
        inner.recommendation_links.insert(key, record.clone());

        Ok(Upserted {
            record,
            created: true,
        })
    }

    async fn preferred_genres(&self, user: Uuid) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner.preferred_genres.get(&user).cloned().unwrap_or_default())
    }

    async fn store_preferred_genres(&self, user: Uuid, genres: &[String]) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.preferred_genres.insert(user, genres.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn watchlist_entry(id: i64, title: &str) -> NewCollectionItem {
        NewCollectionItem {
            external_id: id,
            display_name: title.to_string(),
            image_path: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_twice_creates_once() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        let first = assert_ok!(
            store
                .upsert_collection_item(user, Collection::Watchlist, watchlist_entry(603, "The Matrix"))
                .await
        );
        assert!(first.created);

        let second = assert_ok!(
            store
                .upsert_collection_item(user, Collection::Watchlist, watchlist_entry(603, "Renamed"))
                .await
        );
        assert!(!second.created);
        assert_eq!(second.record.display_name, "The Matrix");
        assert_eq!(second.record, first.record);

        let items = assert_ok!(store.list_collection(user, Collection::Watchlist).await);
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_collections_are_scoped_by_user_and_kind() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        assert_ok!(
            store
                .upsert_collection_item(alice, Collection::Watchlist, watchlist_entry(1, "A"))
                .await
        );
        let created_for_bob = assert_ok!(
            store
                .upsert_collection_item(bob, Collection::Watchlist, watchlist_entry(1, "A"))
                .await
        );
        assert!(created_for_bob.created);

        let favorites = assert_ok!(store.list_collection(alice, Collection::FavoriteMovies).await);
        assert!(favorites.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_upserts_store_one_row() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .upsert_collection_item(
                            user,
                            Collection::FavoriteActors,
                            watchlist_entry(287, "Brad Pitt"),
                        )
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().created {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        let items = store
            .list_collection(user, Collection::FavoriteActors)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_missing_entry_reports_false() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        assert!(!assert_ok!(
            store.remove_collection_item(user, Collection::Watchlist, 42).await
        ));

        assert_ok!(
            store
                .upsert_collection_item(user, Collection::Watchlist, watchlist_entry(42, "X"))
                .await
        );
        assert!(assert_ok!(
            store.remove_collection_item(user, Collection::Watchlist, 42).await
        ));
        assert!(!assert_ok!(
            store.remove_collection_item(user, Collection::Watchlist, 42).await
        ));
    }

    #[tokio::test]
    async fn test_recommendation_feedback_is_insert_once() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        assert_ok!(
            store
                .record_recommendation_feedback(user, 550, 680, Verdict::Like)
                .await
        );

        let err = assert_err!(
            store
                .record_recommendation_feedback(user, 550, 680, Verdict::Dislike)
                .await
        );
        assert!(matches!(err, AppError::Conflict(_)));

        assert_ok!(
            store
                .record_recommendation_feedback(user, 550, 681, Verdict::Dislike)
                .await
        );
    }

    #[tokio::test]
    async fn test_recommendation_link_is_idempotent() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        let first = assert_ok!(store.upsert_recommendation_link(user, 1399, 1396).await);
        let second = assert_ok!(store.upsert_recommendation_link(user, 1399, 1396).await);

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.record, second.record);
    }

    #[tokio::test]
    async fn test_replace_preferred_genres_canonicalizes() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        assert!(assert_ok!(store.preferred_genres(user).await).is_empty());

        let requested = vec![
            "drama".to_string(),
            "DRAMA".to_string(),
            "Not-A-Genre".to_string(),
        ];
        let update = assert_ok!(store.replace_preferred_genres(user, &requested).await);
        assert_eq!(update.saved, vec!["Drama".to_string()]);
        assert_eq!(update.invalid, vec!["Not-A-Genre".to_string()]);
        assert_eq!(
            assert_ok!(store.preferred_genres(user).await),
            vec!["Drama".to_string()]
        );

        let update = assert_ok!(
            store
                .replace_preferred_genres(user, &["kids".to_string()])
                .await
        );
        assert_eq!(update.saved, vec!["Kids".to_string()]);
        assert_eq!(
            assert_ok!(store.preferred_genres(user).await),
            vec!["Kids".to_string()]
        );
    }

    #[tokio::test]
    async fn test_recent_searches_newest_first_and_clearable() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        for title in ["Alien", "Aliens", "Alien 3"] {
            assert_ok!(store.record_search(user, SearchKind::Movie, title).await);
        }
        assert_ok!(store.record_search(user, SearchKind::Tv, "Dark").await);

        let recent = assert_ok!(store.recent_searches(user, SearchKind::Movie, 2).await);
        let titles: Vec<&str> = recent.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Alien 3", "Aliens"]);

        assert_eq!(assert_ok!(store.clear_searches(user, SearchKind::Movie).await), 3);
        assert_eq!(assert_ok!(store.clear_searches(user, SearchKind::Movie).await), 0);
        assert_eq!(
            assert_ok!(store.recent_searches(user, SearchKind::Tv, 20).await).len(),
            1
        );
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();

        let user = assert_ok!(store.create_user("ripley", "hash").await);
        let err = assert_err!(store.create_user("ripley", "other").await);
        assert!(matches!(err, AppError::Conflict(_)));

        let found = assert_ok!(store.find_user_by_username("ripley").await);
        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(assert_ok!(store.find_user_by_id(Uuid::new_v4()).await).is_none());
    }

    #[tokio::test]
    async fn test_movie_feedback_appends() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        let feedback = NewMovieFeedback {
            movie_title: "Heat".to_string(),
            rating: Verdict::Like,
            comment: None,
        };
        let first = assert_ok!(store.record_movie_feedback(user, feedback.clone()).await);
        let second = assert_ok!(store.record_movie_feedback(user, feedback).await);

        assert_ne!(first.id, second.id);
        assert_eq!(second.rating, Verdict::Like);
    }
}
