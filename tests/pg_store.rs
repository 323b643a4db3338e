//! PostgreSQL store tests. Run with `DATABASE_URL` set and `--ignored`.

use sqlx::PgPool;
use uuid::Uuid;

use marquee_api::{
    error::AppError,
    models::{Collection, NewCollectionItem, NewMovieFeedback, SearchKind, Verdict},
    services::{PgStore, PreferenceStore, UserStore},
};

async fn store_with_user(pool: PgPool) -> (PgStore, Uuid) {
    let store = PgStore::new(pool);
    let user = store.create_user("ripley", "hash").await.unwrap();
    (store, user.id)
}

fn movie(id: i64, title: &str) -> NewCollectionItem {
    NewCollectionItem {
        external_id: id,
        display_name: title.to_string(),
        image_path: None,
    }
}

#[sqlx::test(migrator = "marquee_api::MIGRATOR")]
#[ignore]
async fn test_upsert_creates_once(pool: PgPool) {
    let (store, user) = store_with_user(pool).await;
    let item = NewCollectionItem {
        external_id: 348,
        display_name: "Alien".to_string(),
        image_path: None,
    };

    let first = store
        .upsert_collection_item(user, Collection::Watchlist, item.clone())
        .await
        .unwrap();
    let second = store
        .upsert_collection_item(user, Collection::Watchlist, item)
        .await
        .unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.record, second.record);
    assert_eq!(
        store
            .list_collection(user, Collection::Watchlist)
            .await
            .unwrap()
            .len(),
        1
    );

    assert!(store
        .remove_collection_item(user, Collection::Watchlist, 348)
        .await
        .unwrap());
    assert!(!store
        .remove_collection_item(user, Collection::Watchlist, 348)
        .await
        .unwrap());
}

#[sqlx::test(migrator = "marquee_api::MIGRATOR")]
#[ignore]
async fn test_duplicate_username_conflicts(pool: PgPool) {
    let (store, _) = store_with_user(pool).await;

    let err = store.create_user("ripley", "other").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[sqlx::test(migrator = "marquee_api::MIGRATOR")]
#[ignore]
async fn test_recommendation_feedback_conflicts(pool: PgPool) {
    let (store, user) = store_with_user(pool).await;

    let record = store
        .record_recommendation_feedback(user, 550, 680, Verdict::Like)
        .await
        .unwrap();
    assert_eq!(record.feedback, Verdict::Like);

    let err = store
        .record_recommendation_feedback(user, 550, 680, Verdict::Dislike)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[sqlx::test(migrator = "marquee_api::MIGRATOR")]
#[ignore]
async fn test_recommendation_link_is_idempotent(pool: PgPool) {
    let (store, user) = store_with_user(pool).await;

    let first = store.upsert_recommendation_link(user, 1399, 1396).await.unwrap();
    let second = store.upsert_recommendation_link(user, 1399, 1396).await.unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.record, second.record);
}

#[sqlx::test(migrator = "marquee_api::MIGRATOR")]
#[ignore]
async fn test_preferred_genres_are_replaced(pool: PgPool) {
    let (store, user) = store_with_user(pool).await;
    assert!(store.preferred_genres(user).await.unwrap().is_empty());

    let requested = vec!["drama".to_string(), "DRAMA".to_string(), "Not-A-Genre".to_string()];
    let update = store.replace_preferred_genres(user, &requested).await.unwrap();
    assert_eq!(update.invalid, vec!["Not-A-Genre".to_string()]);
    assert_eq!(store.preferred_genres(user).await.unwrap(), vec!["Drama".to_string()]);

    store
        .replace_preferred_genres(user, &["Kids".to_string(), "News".to_string()])
        .await
        .unwrap();
    assert_eq!(
        store.preferred_genres(user).await.unwrap(),
        vec!["Kids".to_string(), "News".to_string()]
    );
}

#[sqlx::test(migrator = "marquee_api::MIGRATOR")]
#[ignore]
async fn test_search_log_clear(pool: PgPool) {
    let (store, user) = store_with_user(pool).await;

    store.record_search(user, SearchKind::Tv, "Dark").await.unwrap();
    store.record_search(user, SearchKind::Tv, "1899").await.unwrap();

    let recent = store.recent_searches(user, SearchKind::Tv, 20).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert!(store
        .recent_searches(user, SearchKind::Movie, 20)
        .await
        .unwrap()
        .is_empty());

    assert_eq!(store.clear_searches(user, SearchKind::Tv).await.unwrap(), 2);
    assert_eq!(store.clear_searches(user, SearchKind::Tv).await.unwrap(), 0);
}

#[sqlx::test(migrator = "marquee_api::MIGRATOR")]
#[ignore]
async fn test_collection_lists_newest_first(pool: PgPool) {
    let (store, user) = store_with_user(pool).await;

    for (id, title) in [(348, "Alien"), (679, "Aliens"), (8077, "Alien 3")] {
        store
            .upsert_collection_item(user, Collection::FavoriteMovies, movie(id, title))
            .await
            .unwrap();
    }

    let ids: Vec<i64> = store
        .list_collection(user, Collection::FavoriteMovies)
        .await
        .unwrap()
        .iter()
        .map(|item| item.external_id)
        .collect();
    assert_eq!(ids, vec![8077, 679, 348]);

    // Collections are separate tables
    assert!(store
        .list_collection(user, Collection::Watchlist)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrator = "marquee_api::MIGRATOR")]
#[ignore]
async fn test_remove_only_touches_the_owner(pool: PgPool) {
    let (store, ripley) = store_with_user(pool).await;
    let hicks = store.create_user("hicks", "hash").await.unwrap().id;

    for user in [ripley, hicks] {
        store
            .upsert_collection_item(user, Collection::FavoriteActors, movie(10205, "Sigourney Weaver"))
            .await
            .unwrap();
    }

    assert!(store
        .remove_collection_item(ripley, Collection::FavoriteActors, 10205)
        .await
        .unwrap());
    assert!(store
        .list_collection(ripley, Collection::FavoriteActors)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        store
            .list_collection(hicks, Collection::FavoriteActors)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[sqlx::test(migrator = "marquee_api::MIGRATOR")]
#[ignore]
async fn test_upsert_after_remove_creates_again(pool: PgPool) {
    let (store, user) = store_with_user(pool).await;

    store
        .upsert_collection_item(user, Collection::Watchlist, movie(348, "Alien"))
        .await
        .unwrap();
    store
        .remove_collection_item(user, Collection::Watchlist, 348)
        .await
        .unwrap();

    let again = store
        .upsert_collection_item(user, Collection::Watchlist, movie(348, "Alien"))
        .await
        .unwrap();
    assert!(again.created);
}

#[sqlx::test(migrator = "marquee_api::MIGRATOR")]
#[ignore]
async fn test_upsert_survives_concurrent_removes(pool: PgPool) {
    let (store, user) = store_with_user(pool).await;

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                store
                    .upsert_collection_item(user, Collection::Watchlist, movie(348, "Alien"))
                    .await
                    .map(|_| ())
            } else {
                store
                    .remove_collection_item(user, Collection::Watchlist, 348)
                    .await
                    .map(|_| ())
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }
}

#[sqlx::test(migrator = "marquee_api::MIGRATOR")]
#[ignore]
async fn test_movie_feedback_round_trips_through_schema(pool: PgPool) {
    let (store, user) = store_with_user(pool).await;

    let first = store
        .record_movie_feedback(
            user,
            NewMovieFeedback {
                movie_title: "Alien".to_string(),
                rating: Verdict::Like,
                comment: Some("Still terrifying".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(first.rating, Verdict::Like);
    assert_eq!(first.comment.as_deref(), Some("Still terrifying"));

    // Append-only: the same title can be rated again
    let second = store
        .record_movie_feedback(
            user,
            NewMovieFeedback {
                movie_title: "Alien".to_string(),
                rating: Verdict::Dislike,
                comment: None,
            },
        )
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(second.rating, Verdict::Dislike);
    assert_eq!(second.comment, None);
}
