/// TMDb (The Movie Database) v3 provider
///
/// Every call authenticates with the `api_key` query parameter and asks for the
/// configured language. Composite views (credits, filmography, watch providers)
/// issue the details request and the sub-resource request concurrently.
use std::collections::HashMap;

use reqwest::{Client as HttpClient, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    config::Config,
    models::{
        CastMember, CatalogItem, CrewMember, MediaKind, MovieCredits, PersonFilmography,
        PersonSummary, WatchAvailability, WatchProvider, NO_DESCRIPTION, UNKNOWN,
    },
    services::providers::{MetadataProvider, UpstreamError, UpstreamResult},
};

const FIRST_PAGE: &str = "1";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base_url: String,
    language: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String, image_base_url: String, language: String) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("TMDB_API_KEY is empty, upstream lookups will be rejected");
        }

        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            image_base_url,
            language,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_image_base_url.clone(),
            config.tmdb_language.clone(),
        )
    }

    /// Expands a TMDb image path into an absolute URL
    fn image_url(&self, path: Option<String>) -> Option<String> {
        path.filter(|p| !p.trim().is_empty())
            .map(|p| format!("{}{}", self.image_base_url.trim_end_matches('/'), p))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> UpstreamResult<T> {
        let url = format!("{}{}", self.api_url.trim_end_matches('/'), path);
        tracing::debug!(path = %path, "TMDb request");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(params)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: status_message(status, &body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, path = %path, "Failed to deserialize TMDb response");
            UpstreamError::Decode(e.to_string())
        })
    }

    async fn list(
        &self,
        kind: MediaKind,
        path: &str,
        params: &[(&str, &str)],
    ) -> UpstreamResult<Vec<CatalogItem>> {
        let mut all_params = vec![("page", FIRST_PAGE)];
        all_params.extend_from_slice(params);

        let page: TmdbPage<TmdbTitle> = self.get_json(path, &all_params).await?;
        let items: Vec<CatalogItem> = page
            .results
            .into_iter()
            .map(|t| self.catalog_item(kind, t))
            .collect();

        tracing::info!(
            path = %path,
            results = items.len(),
            provider = "tmdb",
            "Catalog lookup completed"
        );

        Ok(items)
    }

    fn catalog_item(&self, kind: MediaKind, raw: TmdbTitle) -> CatalogItem {
        let (title, date) = match kind {
            MediaKind::Movie => (
                raw.title.or(raw.name),
                raw.release_date.or(raw.first_air_date),
            ),
            MediaKind::Tv => (
                raw.name.or(raw.title),
                raw.first_air_date.or(raw.release_date),
            ),
        };

        let genre_ids = if raw.genre_ids.is_empty() {
            raw.genres.iter().map(|g| g.id).collect()
        } else {
            raw.genre_ids
        };

        CatalogItem {
            id: raw.id,
            title: title.unwrap_or_else(|| UNKNOWN.to_string()),
            overview: raw.overview.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            release_date: date.unwrap_or_else(|| UNKNOWN.to_string()),
            poster_path: self.image_url(raw.poster_path),
            rating: raw.vote_average.unwrap_or(0.0),
            genre_ids,
        }
    }

    fn watch_provider(&self, raw: TmdbWatchProvider) -> WatchProvider {
        WatchProvider {
            provider_id: raw.provider_id,
            provider_name: raw.provider_name.unwrap_or_else(|| UNKNOWN.to_string()),
            logo_path: self.image_url(raw.logo_path),
        }
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn search(&self, kind: MediaKind, query: &str) -> UpstreamResult<Vec<CatalogItem>> {
        let path = format!("/search/{}", kind.path_segment());
        self.list(kind, &path, &[("query", query)]).await
    }

    async fn trending(&self, kind: MediaKind) -> UpstreamResult<Vec<CatalogItem>> {
        let path = format!("/trending/{}/week", kind.path_segment());
        self.list(kind, &path, &[]).await
    }

    async fn top_rated(&self, kind: MediaKind) -> UpstreamResult<Vec<CatalogItem>> {
        let path = format!("/{}/top_rated", kind.path_segment());
        self.list(kind, &path, &[]).await
    }

    async fn recommendations(
        &self,
        kind: MediaKind,
        id: i64,
    ) -> UpstreamResult<Vec<CatalogItem>> {
        let path = format!("/{}/{}/recommendations", kind.path_segment(), id);
        self.list(kind, &path, &[]).await
    }

    async fn search_people(&self, query: &str) -> UpstreamResult<Vec<PersonSummary>> {
        let page: TmdbPage<TmdbPerson> = self
            .get_json("/search/person", &[("query", query), ("page", FIRST_PAGE)])
            .await?;

        Ok(page
            .results
            .into_iter()
            .map(|p| PersonSummary {
                id: p.id,
                name: p.name.unwrap_or_else(|| UNKNOWN.to_string()),
                known_for_department: p
                    .known_for_department
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                profile_path: self.image_url(p.profile_path),
            })
            .collect())
    }

    async fn person_movies(&self, person_id: i64) -> UpstreamResult<PersonFilmography> {
        let details_path = format!("/person/{}", person_id);
        let credits_path = format!("/person/{}/movie_credits", person_id);

        let (person, credits) = tokio::try_join!(
            self.get_json::<TmdbPerson>(&details_path, &[]),
            self.get_json::<TmdbMovieCredits>(&credits_path, &[]),
        )?;

        Ok(PersonFilmography {
            id: person.id,
            name: person.name.unwrap_or_else(|| UNKNOWN.to_string()),
            profile_path: self.image_url(person.profile_path),
            movies: credits
                .cast
                .into_iter()
                .map(|t| self.catalog_item(MediaKind::Movie, t))
                .collect(),
        })
    }

    async fn movie_credits(&self, movie_id: i64) -> UpstreamResult<MovieCredits> {
        let details_path = format!("/movie/{}", movie_id);
        let credits_path = format!("/movie/{}/credits", movie_id);

        let (details, credits) = tokio::try_join!(
            self.get_json::<TmdbTitle>(&details_path, &[]),
            self.get_json::<TmdbCredits>(&credits_path, &[]),
        )?;

        let title = self.catalog_item(MediaKind::Movie, details).title;

        Ok(MovieCredits {
            id: movie_id,
            title,
            cast: credits
                .cast
                .into_iter()
                .map(|c| CastMember {
                    id: c.id,
                    name: c.name.unwrap_or_else(|| UNKNOWN.to_string()),
                    character: c.character.unwrap_or_else(|| UNKNOWN.to_string()),
                    profile_path: self.image_url(c.profile_path),
                })
                .collect(),
            crew: credits
                .crew
                .into_iter()
                .map(|c| CrewMember {
                    id: c.id,
                    name: c.name.unwrap_or_else(|| UNKNOWN.to_string()),
                    job: c.job.unwrap_or_else(|| UNKNOWN.to_string()),
                    department: c.department.unwrap_or_else(|| UNKNOWN.to_string()),
                    profile_path: self.image_url(c.profile_path),
                })
                .collect(),
        })
    }

    async fn watch_providers(
        &self,
        kind: MediaKind,
        id: i64,
        region: &str,
    ) -> UpstreamResult<WatchAvailability> {
        let details_path = format!("/{}/{}", kind.path_segment(), id);
        let providers_path = format!("/{}/{}/watch/providers", kind.path_segment(), id);

        let (details, mut providers) = tokio::try_join!(
            self.get_json::<TmdbTitle>(&details_path, &[]),
            self.get_json::<TmdbWatchProviders>(&providers_path, &[]),
        )?;

        let region = region.trim().to_ascii_uppercase();
        let listing = providers.results.remove(&region).unwrap_or_default();
        let title = self.catalog_item(kind, details).title;

        Ok(WatchAvailability {
            id,
            title,
            region,
            link: listing.link,
            flatrate: listing
                .flatrate
                .into_iter()
                .map(|p| self.watch_provider(p))
                .collect(),
            rent: listing
                .rent
                .into_iter()
                .map(|p| self.watch_provider(p))
                .collect(),
            buy: listing
                .buy
                .into_iter()
                .map(|p| self.watch_provider(p))
                .collect(),
        })
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

/// Pulls `status_message` out of a TMDb error body, falling back to the reason phrase
fn status_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct TmdbErrorBody {
        status_message: Option<String>,
    }

    serde_json::from_str::<TmdbErrorBody>(body)
        .ok()
        .and_then(|b| b.status_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        })
}

// ============================================================================
// TMDb wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbPage<T> {
    results: Vec<T>,
}

/// Movie or TV result; movies use `title`/`release_date`, TV uses `name`/`first_air_date`
#[derive(Debug, Deserialize)]
struct TmdbTitle {
    id: i64,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    #[serde(default)]
    genre_ids: Vec<i64>,
    /// Detail endpoints return full genre objects instead of ids
    #[serde(default)]
    genres: Vec<TmdbGenre>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TmdbPerson {
    id: i64,
    name: Option<String>,
    known_for_department: Option<String>,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieCredits {
    #[serde(default)]
    cast: Vec<TmdbTitle>,
}

#[derive(Debug, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbCast>,
    #[serde(default)]
    crew: Vec<TmdbCrew>,
}

#[derive(Debug, Deserialize)]
struct TmdbCast {
    id: i64,
    name: Option<String>,
    character: Option<String>,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbCrew {
    id: i64,
    name: Option<String>,
    job: Option<String>,
    department: Option<String>,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbWatchProviders {
    #[serde(default)]
    results: HashMap<String, TmdbRegionProviders>,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbRegionProviders {
    link: Option<String>,
    #[serde(default)]
    flatrate: Vec<TmdbWatchProvider>,
    #[serde(default)]
    rent: Vec<TmdbWatchProvider>,
    #[serde(default)]
    buy: Vec<TmdbWatchProvider>,
}

#[derive(Debug, Deserialize)]
struct TmdbWatchProvider {
    provider_id: i64,
    provider_name: Option<String>,
    logo_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_provider() -> TmdbProvider {
        TmdbProvider::new(
            "test_key".to_string(),
            "http://test.local/3".to_string(),
            "https://image.tmdb.org/t/p/w500/".to_string(),
            "en-US".to_string(),
        )
    }

    #[test]
    fn test_movie_result_normalization() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "overview": "Cobb steals secrets.",
            "release_date": "2010-07-15",
            "poster_path": "/oYuLEt3zVCKq57qu2F8dT7NIa6f.jpg",
            "vote_average": 8.4,
            "genre_ids": [28, 878, 12]
        }"#;
        let raw: TmdbTitle = serde_json::from_str(json).unwrap();

        let item = create_test_provider().catalog_item(MediaKind::Movie, raw);
        assert_eq!(item.id, 27205);
        assert_eq!(item.title, "Inception");
        assert_eq!(item.release_date, "2010-07-15");
        assert_eq!(
            item.poster_path.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/oYuLEt3zVCKq57qu2F8dT7NIa6f.jpg")
        );
        assert_eq!(item.rating, 8.4);
        assert_eq!(item.genre_ids, vec![28, 878, 12]);
    }

    #[test]
    fn test_tv_result_uses_name_and_first_air_date() {
        let json = r#"{
            "id": 1396,
            "name": "Breaking Bad",
            "first_air_date": "2008-01-20",
            "vote_average": 8.9,
            "genre_ids": [18, 80]
        }"#;
        let raw: TmdbTitle = serde_json::from_str(json).unwrap();

        let item = create_test_provider().catalog_item(MediaKind::Tv, raw);
        assert_eq!(item.title, "Breaking Bad");
        assert_eq!(item.release_date, "2008-01-20");
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let raw: TmdbTitle = serde_json::from_str(r#"{"id": 7, "poster_path": null}"#).unwrap();

        let item = create_test_provider().catalog_item(MediaKind::Movie, raw);
        assert_eq!(item.title, UNKNOWN);
        assert_eq!(item.overview, NO_DESCRIPTION);
        assert_eq!(item.release_date, UNKNOWN);
        assert_eq!(item.poster_path, None);
        assert_eq!(item.rating, 0.0);
        assert!(item.genre_ids.is_empty());
    }

    #[test]
    fn test_detail_genres_become_genre_ids() {
        let json = r#"{"id": 1, "title": "X", "genres": [{"id": 18, "name": "Drama"}]}"#;
        let raw: TmdbTitle = serde_json::from_str(json).unwrap();

        let item = create_test_provider().catalog_item(MediaKind::Movie, raw);
        assert_eq!(item.genre_ids, vec![18]);
    }

    #[test]
    fn test_empty_image_path_is_none() {
        let provider = create_test_provider();
        assert_eq!(provider.image_url(Some(String::new())), None);
        assert_eq!(provider.image_url(None), None);
    }

    #[test]
    fn test_status_message_prefers_tmdb_body() {
        let body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;
        assert_eq!(
            status_message(StatusCode::UNAUTHORIZED, body),
            "Invalid API key: You must be granted a valid key."
        );
        assert_eq!(
            status_message(StatusCode::SERVICE_UNAVAILABLE, "<html>"),
            "Service Unavailable"
        );
    }

    #[test]
    fn test_watch_provider_regions_deserialize() {
        let json = r#"{
            "id": 550,
            "results": {
                "US": {
                    "link": "https://www.themoviedb.org/movie/550/watch?locale=US",
                    "flatrate": [{"provider_id": 8, "provider_name": "Netflix", "logo_path": "/n.jpg"}],
                    "rent": []
                }
            }
        }"#;
        let mut parsed: TmdbWatchProviders = serde_json::from_str(json).unwrap();
        let us = parsed.results.remove("US").unwrap();
        assert_eq!(us.flatrate.len(), 1);
        assert!(us.buy.is_empty());

        let provider = create_test_provider();
        let netflix = provider.watch_provider(us.flatrate.into_iter().next().unwrap());
        assert_eq!(netflix.provider_name, "Netflix");
        assert_eq!(
            netflix.logo_path.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/n.jpg")
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_not_raised() {
        let provider = TmdbProvider::new(
            "test_key".to_string(),
            "http://127.0.0.1:1".to_string(),
            "https://image.tmdb.org/t/p/w500".to_string(),
            "en-US".to_string(),
        );

        let result = provider.search(MediaKind::Movie, "Inception").await;
        assert!(matches!(result, Err(UpstreamError::Transport(_))));
    }
}
