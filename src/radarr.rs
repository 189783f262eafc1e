use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::arr::{ArrHttp, QualityProfile, RootFolder, Service, SystemStatus};
use crate::error::{ArrError, ArrResult};

#[async_trait]
pub trait RadarrApi: Send + Sync {
    async fn lookup_movies(&self, term: &str) -> ArrResult<Vec<MovieResource>>;
    async fn lookup_movie_by_tmdb(&self, tmdb_id: i64) -> ArrResult<MovieResource>;
    /// The library entry for `tmdb_id`, if the movie was already added.
    async fn find_movie(&self, tmdb_id: i64) -> ArrResult<Option<MovieResource>>;
    async fn add_movie(&self, request: &AddMovieRequest) -> ArrResult<MovieResource>;
    async fn root_folders(&self) -> ArrResult<Vec<RootFolder>>;
    async fn quality_profiles(&self) -> ArrResult<Vec<QualityProfile>>;
    async fn system_status(&self) -> ArrResult<SystemStatus>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieResource {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub remote_poster: Option<String>,
    #[serde(default)]
    pub title_slug: Option<String>,
    #[serde(default)]
    pub images: Vec<Value>,
}

impl MovieResource {
    /// Radarr reports a non-zero id only for movies already in the library.
    pub fn library_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMovieRequest {
    pub title: String,
    pub tmdb_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_slug: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Value>,
    pub quality_profile_id: i32,
    pub root_folder_path: String,
    pub monitored: bool,
    pub minimum_availability: String,
    pub add_options: MovieAddOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieAddOptions {
    pub search_for_movie: bool,
}

#[derive(Debug, Clone)]
pub struct RadarrClient {
    http: ArrHttp,
}

impl RadarrClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> ArrResult<Self> {
        Ok(Self {
            http: ArrHttp::new(Service::Radarr, base_url, api_key, timeout)?,
        })
    }
}

#[async_trait]
impl RadarrApi for RadarrClient {
    async fn lookup_movies(&self, term: &str) -> ArrResult<Vec<MovieResource>> {
        info!("Radarr lookup for '{}'", term);
        let path = format!("movie/lookup?term={}", urlencoding::encode(term));
        let results: Vec<MovieResource> = self.http.get_json(&path).await?;
        info!("Radarr returned {} results for '{}'", results.len(), term);
        if let Some(first) = results.first() {
            info!(
                "First result: {} ({})",
                first.title,
                first.year.map(|y| y.to_string()).unwrap_or_else(|| "no year".into())
            );
        }
        Ok(results)
    }

    async fn lookup_movie_by_tmdb(&self, tmdb_id: i64) -> ArrResult<MovieResource> {
        let path = format!("movie/lookup/tmdb?tmdbId={tmdb_id}");
        self.http.get_json(&path).await.map_err(|e| match e {
            ArrError::NotFound { service, .. } => ArrError::NotFound {
                service,
                what: format!("TMDb id {tmdb_id}"),
            },
            other => other,
        })
    }

    async fn find_movie(&self, tmdb_id: i64) -> ArrResult<Option<MovieResource>> {
        let path = format!("movie?tmdbId={tmdb_id}");
        let movies: Vec<MovieResource> = self.http.get_json(&path).await?;
        Ok(movies
            .into_iter()
            .find(|m| m.tmdb_id == Some(tmdb_id) && m.library_id().is_some()))
    }

    async fn add_movie(&self, request: &AddMovieRequest) -> ArrResult<MovieResource> {
        info!(
            "Adding '{}' (TMDb {}) to Radarr under {}",
            request.title, request.tmdb_id, request.root_folder_path
        );
        self.http
            .post_json("movie", request)
            .await
            .map_err(|e| match e {
                ArrError::Duplicate {
                    service,
                    library_id,
                    ..
                } => ArrError::Duplicate {
                    service,
                    what: format!("'{}' (TMDb {})", request.title, request.tmdb_id),
                    library_id,
                },
                other => other,
            })
    }

    async fn root_folders(&self) -> ArrResult<Vec<RootFolder>> {
        self.http.get_json("rootfolder").await
    }

    async fn quality_profiles(&self) -> ArrResult<Vec<QualityProfile>> {
        self.http.get_json("qualityprofile").await
    }

    async fn system_status(&self) -> ArrResult<SystemStatus> {
        self.http.get_json("system/status").await
    }
}
