use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::arr::{pick_root_folder, QualityProfile, RootFolder, Service, SystemStatus};
use crate::config::Config;
use crate::error::{ArrError, ArrResult};
use crate::models::{
    AddMediaResponse, ConfigReport, Connectivity, ConnectivityCheck, MovieCandidate,
    MovieSearchResponse, ServerStatus, ServerStatusReport, ShowCandidate, ShowSearchResponse,
};
use crate::radarr::{AddMovieRequest, MovieAddOptions, RadarrApi, RadarrClient};
use crate::resolve;
use crate::sonarr::{AddSeriesRequest, SeriesAddOptions, SeriesResource, SonarrApi, SonarrClient};

const MAX_MOVIE_RESULTS: usize = 10;
const MAX_SHOW_RESULTS: usize = 5;
const CONNECTIVITY_PROBE: &str = "test";

#[derive(Debug, Deserialize)]
pub struct SearchMoviesArgs {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMovieArgs {
    pub tmdb_id: i64,
    #[serde(default)]
    pub root_folder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchShowArgs {
    pub description: String,
    #[serde(default)]
    pub auto_add: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddShowArgs {
    pub tvdb_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub root_folder: Option<String>,
}

/// The tool operations, bound to the configured backends.
#[derive(Clone)]
pub struct Tools {
    config: Arc<Config>,
    radarr: Option<Arc<dyn RadarrApi>>,
    sonarr: Option<Arc<dyn SonarrApi>>,
}

impl Tools {
    pub fn new(
        config: Config,
        radarr: Option<Arc<dyn RadarrApi>>,
        sonarr: Option<Arc<dyn SonarrApi>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            radarr,
            sonarr,
        }
    }

    /// Builds HTTP clients for every service that has an API key.
    pub fn from_config(config: Config) -> ArrResult<Self> {
        let radarr: Option<Arc<dyn RadarrApi>> = match config.radarr_api_key.as_deref() {
            Some(key) => Some(Arc::new(RadarrClient::new(
                &config.radarr_url,
                key,
                config.request_timeout,
            )?)),
            None => {
                warn!("RADARR_API_KEY not set - movie tools are disabled");
                None
            }
        };
        let sonarr: Option<Arc<dyn SonarrApi>> = match config.sonarr_api_key.as_deref() {
            Some(key) => Some(Arc::new(SonarrClient::new(
                &config.sonarr_url,
                key,
                config.request_timeout,
            )?)),
            None => {
                warn!("SONARR_API_KEY not set - TV tools are disabled");
                None
            }
        };
        Ok(Self::new(config, radarr, sonarr))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn radarr(&self) -> ArrResult<&dyn RadarrApi> {
        self.radarr
            .as_deref()
            .ok_or_else(|| ArrError::not_configured(Service::Radarr))
    }

    fn sonarr(&self) -> ArrResult<&dyn SonarrApi> {
        self.sonarr
            .as_deref()
            .ok_or_else(|| ArrError::not_configured(Service::Sonarr))
    }

    pub async fn search_movies(&self, title: &str) -> ArrResult<MovieSearchResponse> {
        let radarr = self.radarr()?;
        let query = non_empty(title, "title")?;
        let term = resolve::movie_lookup_term(query);
        info!("Searching for movies: '{}'", term);

        let results: Vec<MovieCandidate> = radarr
            .lookup_movies(&term)
            .await?
            .into_iter()
            .filter_map(MovieCandidate::from_resource)
            .take(MAX_MOVIE_RESULTS)
            .collect();

        let message = results
            .is_empty()
            .then(|| format!("No movies found matching '{query}'"));
        Ok(MovieSearchResponse {
            searched_query: query.to_string(),
            total_found: results.len(),
            results,
            message,
        })
    }

    pub async fn add_movie_by_id(
        &self,
        tmdb_id: i64,
        root_folder: Option<&str>,
    ) -> ArrResult<AddMediaResponse> {
        let radarr = self.radarr()?;
        positive(tmdb_id, "tmdb_id")?;

        if let Some(existing) = radarr.find_movie(tmdb_id).await? {
            info!("'{}' (TMDb {}) is already in Radarr", existing.title, tmdb_id);
            return Err(ArrError::Duplicate {
                service: Service::Radarr,
                what: format!("'{}' (TMDb {})", existing.title, tmdb_id),
                library_id: existing.library_id(),
            });
        }

        let movie = radarr.lookup_movie_by_tmdb(tmdb_id).await?;
        let root = resolve_root_folder(
            Service::Radarr,
            root_folder,
            self.config.radarr_root_folder.as_deref(),
            radarr.root_folders(),
        )
        .await?;

        let request = AddMovieRequest {
            title: movie.title.clone(),
            tmdb_id,
            year: movie.year.filter(|y| *y > 0),
            title_slug: movie.title_slug,
            images: movie.images,
            quality_profile_id: self.config.quality_profile_id,
            root_folder_path: root.clone(),
            monitored: true,
            minimum_availability: "announced".to_string(),
            add_options: MovieAddOptions {
                search_for_movie: true,
            },
        };
        let added = radarr.add_movie(&request).await?;
        info!("Added '{}' to Radarr (id {:?})", movie.title, added.id);
        Ok(AddMediaResponse {
            success: true,
            message: format!("Successfully added '{}' to Radarr", movie.title),
            media_id: added.library_id(),
            title: Some(movie.title),
            root_folder: Some(root),
        })
    }

    pub async fn search_and_add_show(
        &self,
        description: &str,
        auto_add: bool,
    ) -> ArrResult<ShowSearchResponse> {
        let sonarr = self.sonarr()?;
        let query = non_empty(description, "description")?;
        let term = resolve::show_lookup_term(query);
        info!("Searching for shows: '{}' (auto_add={})", term, auto_add);

        let results: Vec<ShowCandidate> = sonarr
            .lookup_series(&term)
            .await?
            .into_iter()
            .map(ShowCandidate::from)
            .take(MAX_SHOW_RESULTS)
            .collect();

        let mut response = ShowSearchResponse {
            searched_query: query.to_string(),
            total_found: results.len(),
            results: Vec::new(),
            added: None,
            message: None,
        };
        if results.is_empty() {
            response.message = Some(format!("No shows found matching '{query}'"));
            return Ok(response);
        }

        if auto_add {
            match resolve::confirm_match(query, &results) {
                Some(show) if show.already_added => {
                    response.message = Some(format!("'{}' is already in Sonarr", show.title));
                }
                Some(ShowCandidate {
                    tvdb_id: Some(tvdb_id),
                    title,
                    ..
                }) => {
                    let outcome = self
                        .add_series(sonarr, *tvdb_id, Some(title.as_str()), None)
                        .await
                        .unwrap_or_else(|e| {
                            warn!("Auto-add of '{}' failed: {}", title, e);
                            AddMediaResponse::failed(e.to_string())
                        });
                    info!("Auto-add result: {}", outcome.message);
                    response.added = Some(outcome);
                }
                Some(show) => {
                    warn!("Cannot auto-add '{}' - no TVDB id available", show.title);
                    response.message =
                        Some(format!("Cannot auto-add '{}': no TVDB id", show.title));
                }
                None => {
                    response.message = Some(format!(
                        "{} candidates match '{}'; pick one and call add_show_by_tvdb_id",
                        results.len(),
                        query
                    ));
                }
            }
        }

        response.results = results;
        Ok(response)
    }

    pub async fn add_show_by_tvdb_id(
        &self,
        tvdb_id: i64,
        title: Option<&str>,
        root_folder: Option<&str>,
    ) -> ArrResult<AddMediaResponse> {
        let sonarr = self.sonarr()?;
        positive(tvdb_id, "tvdb_id")?;
        self.add_series(sonarr, tvdb_id, title, root_folder).await
    }

    async fn add_series(
        &self,
        sonarr: &dyn SonarrApi,
        tvdb_id: i64,
        title: Option<&str>,
        root_folder: Option<&str>,
    ) -> ArrResult<AddMediaResponse> {
        if let Some(existing) = sonarr.find_series(tvdb_id).await? {
            info!("'{}' (TVDB {}) is already in Sonarr", existing.title, tvdb_id);
            return Err(ArrError::Duplicate {
                service: Service::Sonarr,
                what: format!("'{}' (TVDB {})", existing.title, tvdb_id),
                library_id: existing.library_id(),
            });
        }

        let confirmed = sonarr
            .lookup_series(&format!("tvdb:{tvdb_id}"))
            .await?
            .into_iter()
            .find(|s| s.catalog_id() == Some(tvdb_id));
        let series = match (confirmed, title.map(str::trim).filter(|t| !t.is_empty())) {
            (Some(series), given) => {
                if let Some(given) = given.filter(|g| *g != series.title) {
                    info!("Using catalog title '{}' instead of '{}'", series.title, given);
                }
                series
            }
            (None, Some(given)) => {
                warn!("TVDB {} not found by lookup, adding as '{}'", tvdb_id, given);
                SeriesResource {
                    title: given.to_string(),
                    tvdb_id: Some(tvdb_id),
                    ..SeriesResource::default()
                }
            }
            (None, None) => {
                return Err(ArrError::NotFound {
                    service: Service::Sonarr,
                    what: format!("TVDB id {tvdb_id}"),
                })
            }
        };

        let root = resolve_root_folder(
            Service::Sonarr,
            root_folder,
            self.config.sonarr_root_folder.as_deref(),
            sonarr.root_folders(),
        )
        .await?;

        let request = AddSeriesRequest {
            title: series.title.clone(),
            tvdb_id,
            title_slug: series.title_slug,
            year: series.year.filter(|y| *y > 0),
            images: series.images,
            seasons: series.seasons,
            quality_profile_id: self.config.quality_profile_id,
            language_profile_id: self.config.sonarr_language_profile_id,
            root_folder_path: root.clone(),
            monitored: true,
            season_folder: true,
            add_options: SeriesAddOptions {
                search_for_missing_episodes: true,
            },
        };
        let added = sonarr.add_series(&request).await?;
        info!("Added '{}' to Sonarr (id {:?})", series.title, added.id);
        Ok(AddMediaResponse {
            success: true,
            message: format!("Successfully added '{}' to Sonarr", series.title),
            media_id: added.library_id(),
            title: Some(series.title),
            root_folder: Some(root),
        })
    }

    /// Diagnostic report; never fails, problems are reported inline.
    pub async fn test_config(&self) -> ConfigReport {
        info!("Testing configuration...");
        let config = &self.config;
        let profile = config.quality_profile_id;

        let radarr = match self.radarr.as_deref() {
            Some(api) => {
                probe(
                    api.lookup_movies(CONNECTIVITY_PROBE),
                    api.quality_profiles(),
                    profile,
                )
                .await
            }
            None => ConnectivityCheck::no_api_key(),
        };
        let sonarr = match self.sonarr.as_deref() {
            Some(api) => {
                probe(
                    api.lookup_series(CONNECTIVITY_PROBE),
                    api.quality_profiles(),
                    profile,
                )
                .await
            }
            None => ConnectivityCheck::no_api_key(),
        };

        ConfigReport {
            config_loaded: true,
            radarr_url: config.radarr_url.clone(),
            sonarr_url: config.sonarr_url.clone(),
            radarr_api_key_set: config.radarr_api_key.is_some(),
            sonarr_api_key_set: config.sonarr_api_key.is_some(),
            tvdb_api_key_set: config.tvdb_api_key.is_some(),
            quality_profile_id: profile,
            radarr_root_folder: config.radarr_root_folder.clone(),
            sonarr_root_folder: config.sonarr_root_folder.clone(),
            radarr,
            sonarr,
        }
    }

    pub async fn get_server_status(&self) -> ArrResult<ServerStatusReport> {
        if self.radarr.is_none() && self.sonarr.is_none() {
            return Err(ArrError::NotConfigured(
                "Neither Radarr nor Sonarr is configured (set RADARR_API_KEY and/or SONARR_API_KEY)"
                    .to_string(),
            ));
        }

        let radarr = match self.radarr.as_deref() {
            Some(api) => status_from(api.system_status().await),
            None => ServerStatus::not_configured(ArrError::not_configured(Service::Radarr).to_string()),
        };
        let sonarr = match self.sonarr.as_deref() {
            Some(api) => status_from(api.system_status().await),
            None => ServerStatus::not_configured(ArrError::not_configured(Service::Sonarr).to_string()),
        };

        Ok(ServerStatusReport {
            radarr,
            sonarr,
            timestamp: Utc::now().to_rfc3339(),
        })
    }
}

impl ConnectivityCheck {
    fn no_api_key() -> Self {
        Self {
            search_connectivity: Connectivity::NoApiKey,
            test_results: None,
            quality_profile_found: None,
            quality_profile_name: None,
            error: None,
        }
    }
}

async fn probe<T>(
    search: impl Future<Output = ArrResult<Vec<T>>>,
    profiles: impl Future<Output = ArrResult<Vec<QualityProfile>>>,
    profile_id: i32,
) -> ConnectivityCheck {
    let rows = match search.await {
        Ok(rows) => rows,
        Err(e) => {
            return ConnectivityCheck {
                search_connectivity: Connectivity::Failed,
                test_results: None,
                quality_profile_found: None,
                quality_profile_name: None,
                error: Some(e.to_string()),
            }
        }
    };
    let matched = profiles
        .await
        .map(|list| list.into_iter().find(|p| p.id == profile_id));
    ConnectivityCheck {
        search_connectivity: Connectivity::Success,
        test_results: Some(rows.len()),
        quality_profile_found: matched.as_ref().ok().map(Option::is_some),
        quality_profile_name: matched.ok().flatten().map(|p| p.name),
        error: None,
    }
}

fn status_from(result: ArrResult<SystemStatus>) -> ServerStatus {
    match result {
        Ok(status) => ServerStatus {
            configured: true,
            reachable: true,
            authenticated: true,
            app_name: status.app_name,
            version: status.version,
            error: None,
        },
        Err(e) => ServerStatus {
            configured: true,
            reachable: e.backend_responded(),
            authenticated: !matches!(e, ArrError::Unauthorized { .. }) && e.backend_responded(),
            app_name: None,
            version: None,
            error: Some(e.to_string()),
        },
    }
}

/// Root folder precedence: explicit argument, configured default, first folder the backend reports.
async fn resolve_root_folder(
    service: Service,
    requested: Option<&str>,
    configured: Option<&str>,
    available: impl Future<Output = ArrResult<Vec<RootFolder>>>,
) -> ArrResult<String> {
    if let Some(path) = requested.map(str::trim).filter(|p| !p.is_empty()) {
        info!("Using specified root folder: {}", path);
        return Ok(path.to_string());
    }
    if let Some(path) = configured {
        info!("Using configured root folder: {}", path);
        return Ok(path.to_string());
    }
    let folders = available.await?;
    match pick_root_folder(&folders) {
        Some(folder) => {
            info!("Using auto-detected {} root folder: {}", service, folder.path);
            Ok(folder.path.clone())
        }
        None => Err(ArrError::NotConfigured(format!(
            "No {service} root folder given, configured or available on the server"
        ))),
    }
}

fn non_empty<'a>(value: &'a str, field: &str) -> ArrResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ArrError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

fn positive(id: i64, field: &str) -> ArrResult<()> {
    if id <= 0 {
        return Err(ArrError::InvalidInput(format!(
            "{field} must be a positive id, got {id}"
        )));
    }
    Ok(())
}
