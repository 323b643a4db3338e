use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
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

/// PostgreSQL-backed store
///
/// Table and column names come from the static schemas on [`Collection`] and
/// [`SearchKind`]; user input only ever reaches the database as bind parameters.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique-constraint violation to `Conflict`, anything else to `Database`
fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

/// Insert/select rounds before a get-or-create gives up
const UPSERT_ATTEMPTS: usize = 3;

fn upsert_contended(table: &str) -> AppError {
    AppError::Internal(format!("Row in {} kept changing during save", table))
}

fn parse_verdict(raw: &str) -> AppResult<Verdict> {
    raw.parse()
        .map_err(|_| AppError::Internal(format!("Stored verdict '{}' is invalid", raw)))
}

#[derive(sqlx::FromRow)]
struct MovieFeedbackRow {
    id: i64,
    movie_title: String,
    rating: String,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct RecommendationFeedbackRow {
    movie_id: i64,
    recommended_movie_id: i64,
    feedback: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> AppResult<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, username, password_hash)
             VALUES ($1, $2, $3)
             RETURNING id, username, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, USERNAME_TAKEN))
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl PreferenceStore for PgStore {
    async fn upsert_collection_item(
        &self,
        user: Uuid,
        collection: Collection,
        item: NewCollectionItem,
    ) -> AppResult<Upserted<CollectionItem>> {
        let s = collection.schema();

        let insert = format!(
            "INSERT INTO {table} (user_id, {id}, {name}, {image})
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, {id}) DO NOTHING
             RETURNING {id} AS external_id, {name} AS display_name, {image} AS image_path, added_at",
            table = s.table,
            id = s.id_column,
            name = s.name_column,
            image = s.image_column,
        );

        let select = format!(
            "SELECT {id} AS external_id, {name} AS display_name, {image} AS image_path, added_at
             FROM {table} WHERE user_id = $1 AND {id} = $2",
            table = s.table,
            id = s.id_column,
            name = s.name_column,
            image = s.image_column,
        );

        // The existing row can be deleted between the two statements; go again
        for _ in 0..UPSERT_ATTEMPTS {
            let inserted = sqlx::query_as::<_, CollectionItem>(&insert)
                .bind(user)
                .bind(item.external_id)
                .bind(&item.display_name)
                .bind(&item.image_path)
                .fetch_optional(&self.pool)
                .await?;

            if let Some(record) = inserted {
                return Ok(Upserted {
                    record,
                    created: true,
                });
            }

            let existing = sqlx::query_as::<_, CollectionItem>(&select)
                .bind(user)
                .bind(item.external_id)
                .fetch_optional(&self.pool)
                .await?;

            if let Some(record) = existing {
                return Ok(Upserted {
                    record,
                    created: false,
                });
            }
        }

        Err(upsert_contended(s.table))
    }

    async fn list_collection(
        &self,
        user: Uuid,
        collection: Collection,
    ) -> AppResult<Vec<CollectionItem>> {
        let s = collection.schema();
        let select = format!(
            "SELECT {id} AS external_id, {name} AS display_name, {image} AS image_path, added_at
             FROM {table} WHERE user_id = $1
             ORDER BY added_at DESC, id DESC",
            table = s.table,
            id = s.id_column,
            name = s.name_column,
            image = s.image_column,
        );

        let items = sqlx::query_as::<_, CollectionItem>(&select)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    async fn remove_collection_item(
        &self,
        user: Uuid,
        collection: Collection,
        external_id: i64,
    ) -> AppResult<bool> {
        let s = collection.schema();
        let delete = format!(
            "DELETE FROM {table} WHERE user_id = $1 AND {id} = $2",
            table = s.table,
            id = s.id_column,
        );

        let result = sqlx::query(&delete)
            .bind(user)
            .bind(external_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_search(
        &self,
        user: Uuid,
        kind: SearchKind,
        title: &str,
    ) -> AppResult<RecentSearch> {
        let (table, column) = kind.schema();
        let insert = format!(
            "INSERT INTO {table} (user_id, {column}) VALUES ($1, $2)
             RETURNING {column} AS title, searched_at"
        );

        let search = sqlx::query_as::<_, RecentSearch>(&insert)
            .bind(user)
            .bind(title)
            .fetch_one(&self.pool)
            .await?;

        Ok(search)
    }

    async fn recent_searches(
        &self,
        user: Uuid,
        kind: SearchKind,
        limit: i64,
    ) -> AppResult<Vec<RecentSearch>> {
        let (table, column) = kind.schema();
        let select = format!(
            "SELECT {column} AS title, searched_at FROM {table}
             WHERE user_id = $1
             ORDER BY searched_at DESC, id DESC
             LIMIT $2"
        );

        let searches = sqlx::query_as::<_, RecentSearch>(&select)
            .bind(user)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(searches)
    }

    async fn clear_searches(&self, user: Uuid, kind: SearchKind) -> AppResult<u64> {
        let (table, _) = kind.schema();
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE user_id = $1"))
            .bind(user)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn record_movie_feedback(
        &self,
        user: Uuid,
        feedback: NewMovieFeedback,
    ) -> AppResult<MovieFeedback> {
        let row = sqlx::query_as::<_, MovieFeedbackRow>(
            "INSERT INTO movie_feedback (user_id, movie_title, rating, comment)
             VALUES ($1, $2, $3, $4)
             RETURNING id, movie_title, rating, comment, created_at",
        )
        .bind(user)
        .bind(&feedback.movie_title)
        .bind(feedback.rating.as_str())
        .bind(&feedback.comment)
        .fetch_one(&self.pool)
        .await?;

        Ok(MovieFeedback {
            id: row.id,
            movie_title: row.movie_title,
            rating: parse_verdict(&row.rating)?,
            comment: row.comment,
            created_at: row.created_at,
        })
    }

    async fn record_recommendation_feedback(
        &self,
        user: Uuid,
        movie_id: i64,
        recommended_movie_id: i64,
        feedback: Verdict,
    ) -> AppResult<RecommendationFeedback> {
        let row = sqlx::query_as::<_, RecommendationFeedbackRow>(
            "INSERT INTO movie_recommendation_feedback
                 (user_id, movie_id, recommended_movie_id, feedback)
             VALUES ($1, $2, $3, $4)
             RETURNING movie_id, recommended_movie_id, feedback, created_at",
        )
        .bind(user)
        .bind(movie_id)
        .bind(recommended_movie_id)
        .bind(feedback.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, FEEDBACK_EXISTS))?;

        Ok(RecommendationFeedback {
            movie_id: row.movie_id,
            recommended_movie_id: row.recommended_movie_id,
            feedback: parse_verdict(&row.feedback)?,
            created_at: row.created_at,
        })
    }

    async fn upsert_recommendation_link(
        &self,
        user: Uuid,
        tvshow_id: i64,
        recommended_tv_show_id: i64,
    ) -> AppResult<Upserted<RecommendationLink>> {
        for _ in 0..UPSERT_ATTEMPTS {
            let inserted = sqlx::query_as::<_, RecommendationLink>(
                "INSERT INTO tv_show_recommendations (user_id, tvshow_id, recommended_tv_show_id)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (user_id, tvshow_id, recommended_tv_show_id) DO NOTHING
                 RETURNING tvshow_id, recommended_tv_show_id, created_at",
            )
            .bind(user)
            .bind(tvshow_id)
            .bind(recommended_tv_show_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(record) = inserted {
                return Ok(Upserted {
                    record,
                    created: true,
                });
            }

            let existing = sqlx::query_as::<_, RecommendationLink>(
                "SELECT tvshow_id, recommended_tv_show_id, created_at
                 FROM tv_show_recommendations
                 WHERE user_id = $1 AND tvshow_id = $2 AND recommended_tv_show_id = $3",
            )
            .bind(user)
            .bind(tvshow_id)
            .bind(recommended_tv_show_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(record) = existing {
                return Ok(Upserted {
                    record,
                    created: false,
                });
            }
        }

        Err(upsert_contended("tv_show_recommendations"))
    }

    async fn preferred_genres(&self, user: Uuid) -> AppResult<Vec<String>> {
        let genres: Option<Vec<String>> = sqlx::query_scalar(
            "SELECT preferred_genres FROM tv_show_preferences WHERE user_id = $1",
        )
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;

        Ok(genres.unwrap_or_default())
    }

    async fn store_preferred_genres(&self, user: Uuid, genres: &[String]) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO tv_show_preferences (user_id, preferred_genres)
             VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE
             SET preferred_genres = EXCLUDED.preferred_genres, updated_at = now()",
        )
        .bind(user)
        .bind(genres)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
