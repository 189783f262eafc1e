use serde::{Deserialize, Serialize};

use crate::radarr::MovieResource;
use crate::resolve::Titled;
use crate::sonarr::SeriesResource;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieCandidate {
    pub title: String,
    pub year: Option<i32>,
    pub overview: String,
    pub tmdb_id: i64,
    pub imdb_id: Option<String>,
    pub poster_url: Option<String>,
    pub already_added: bool,
    pub library_id: Option<i64>,
}

impl MovieCandidate {
    /// Lookup rows without a TMDb id cannot be added, so they are dropped.
    pub fn from_resource(movie: MovieResource) -> Option<Self> {
        let tmdb_id = movie.tmdb_id.filter(|id| *id > 0)?;
        let library_id = movie.library_id();
        Some(Self {
            title: movie.title,
            year: movie.year.filter(|y| *y > 0),
            overview: overview_or_default(movie.overview),
            tmdb_id,
            imdb_id: movie.imdb_id.filter(|s| !s.is_empty()),
            poster_url: movie.remote_poster,
            already_added: library_id.is_some(),
            library_id,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShowCandidate {
    pub title: String,
    pub year: Option<i32>,
    pub overview: String,
    pub tvdb_id: Option<i64>,
    pub tmdb_id: Option<i64>,
    pub imdb_id: Option<String>,
    pub poster_url: Option<String>,
    pub already_added: bool,
    pub library_id: Option<i64>,
}

impl From<SeriesResource> for ShowCandidate {
    fn from(series: SeriesResource) -> Self {
        let library_id = series.library_id();
        let tvdb_id = series.catalog_id();
        Self {
            title: series.title,
            year: series.year.filter(|y| *y > 0),
            overview: overview_or_default(series.overview),
            tvdb_id,
            tmdb_id: series.tmdb_id.filter(|id| *id > 0),
            imdb_id: series.imdb_id.filter(|s| !s.is_empty()),
            poster_url: series.remote_poster,
            already_added: library_id.is_some(),
            library_id,
        }
    }
}

impl Titled for MovieCandidate {
    fn title(&self) -> &str {
        &self.title
    }
    fn year(&self) -> Option<i32> {
        self.year
    }
}

impl Titled for ShowCandidate {
    fn title(&self) -> &str {
        &self.title
    }
    fn year(&self) -> Option<i32> {
        self.year
    }
}

fn overview_or_default(overview: Option<String>) -> String {
    overview
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "No overview available".to_string())
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MovieSearchResponse {
    pub searched_query: String,
    pub results: Vec<MovieCandidate>,
    pub total_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShowSearchResponse {
    pub searched_query: String,
    pub results: Vec<ShowCandidate>,
    pub total_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<AddMediaResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AddMediaResponse {
    pub success: bool,
    pub message: String,
    pub media_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<String>,
}

impl AddMediaResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            media_id: None,
            title: None,
            root_folder: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerStatus {
    pub configured: bool,
    pub reachable: bool,
    pub authenticated: bool,
    pub app_name: Option<String>,
    pub version: Option<String>,
    pub error: Option<String>,
}

impl ServerStatus {
    pub fn not_configured(message: String) -> Self {
        Self {
            configured: false,
            reachable: false,
            authenticated: false,
            app_name: None,
            version: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerStatusReport {
    pub radarr: ServerStatus,
    pub sonarr: ServerStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Success,
    Failed,
    NoApiKey,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConnectivityCheck {
    pub search_connectivity: Connectivity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_profile_found: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_profile_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConfigReport {
    pub config_loaded: bool,
    pub radarr_url: String,
    pub sonarr_url: String,
    pub radarr_api_key_set: bool,
    pub sonarr_api_key_set: bool,
    pub tvdb_api_key_set: bool,
    pub quality_profile_id: i32,
    pub radarr_root_folder: Option<String>,
    pub sonarr_root_folder: Option<String>,
    pub radarr: ConnectivityCheck,
    pub sonarr: ConnectivityCheck,
}
