use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::arr::{ArrHttp, QualityProfile, RootFolder, Service, SystemStatus};
use crate::error::{ArrError, ArrResult};

#[async_trait]
pub trait SonarrApi: Send + Sync {
    async fn lookup_series(&self, term: &str) -> ArrResult<Vec<SeriesResource>>;
    /// The library entry for `tvdb_id`, if the series was already added.
    async fn find_series(&self, tvdb_id: i64) -> ArrResult<Option<SeriesResource>>;
    async fn add_series(&self, request: &AddSeriesRequest) -> ArrResult<SeriesResource>;
    async fn root_folders(&self) -> ArrResult<Vec<RootFolder>>;
    async fn quality_profiles(&self) -> ArrResult<Vec<QualityProfile>>;
    async fn system_status(&self) -> ArrResult<SystemStatus>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResource {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tvdb_id: Option<i64>,
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
    #[serde(default)]
    pub seasons: Vec<Value>,
}

impl SeriesResource {
    pub fn library_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }

    /// Lookup rows without a catalog entry come back with tvdbId 0.
    pub fn catalog_id(&self) -> Option<i64> {
        self.tvdb_id.filter(|id| *id > 0)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSeriesRequest {
    pub title: String,
    pub tvdb_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub seasons: Vec<Value>,
    pub quality_profile_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_profile_id: Option<i32>,
    pub root_folder_path: String,
    pub monitored: bool,
    pub season_folder: bool,
    pub add_options: SeriesAddOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesAddOptions {
    pub search_for_missing_episodes: bool,
}

#[derive(Debug, Clone)]
pub struct SonarrClient {
    http: ArrHttp,
}

impl SonarrClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> ArrResult<Self> {
        Ok(Self {
            http: ArrHttp::new(Service::Sonarr, base_url, api_key, timeout)?,
        })
    }
}

#[async_trait]
impl SonarrApi for SonarrClient {
    async fn lookup_series(&self, term: &str) -> ArrResult<Vec<SeriesResource>> {
        info!("Sonarr lookup for '{}'", term);
        let path = format!("series/lookup?term={}", urlencoding::encode(term));
        let results: Vec<SeriesResource> = self.http.get_json(&path).await?;
        info!("Sonarr returned {} results for '{}'", results.len(), term);
        Ok(results)
    }

    async fn find_series(&self, tvdb_id: i64) -> ArrResult<Option<SeriesResource>> {
        let path = format!("series?tvdbId={tvdb_id}");
        let series: Vec<SeriesResource> = self.http.get_json(&path).await?;
        Ok(series
            .into_iter()
            .find(|s| s.tvdb_id == Some(tvdb_id) && s.library_id().is_some()))
    }

    async fn add_series(&self, request: &AddSeriesRequest) -> ArrResult<SeriesResource> {
        info!(
            "Adding '{}' (TVDB {}) to Sonarr under {}",
            request.title, request.tvdb_id, request.root_folder_path
        );
        self.http
            .post_json("series", request)
            .await
            .map_err(|e| match e {
                ArrError::Duplicate {
                    service,
                    library_id,
                    ..
                } => ArrError::Duplicate {
                    service,
                    what: format!("'{}' (TVDB {})", request.title, request.tvdb_id),
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
