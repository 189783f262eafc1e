use arrlink::arr::{QualityProfile, RootFolder, Service, SystemStatus};
use arrlink::config::Config;
use arrlink::error::{ArrError, ArrResult, ErrorKind};
use arrlink::models::Connectivity;
use arrlink::radarr::{AddMovieRequest, MovieResource, RadarrApi};
use arrlink::sonarr::{AddSeriesRequest, SeriesResource, SonarrApi};
use arrlink::tools::Tools;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Default)]
enum StatusMode {
    #[default]
    Up,
    BadKey,
}

#[derive(Default)]
struct FakeRadarr {
    lookup: Vec<MovieResource>,
    library: Vec<MovieResource>,
    catalog: HashMap<i64, MovieResource>,
    root_folders: Vec<RootFolder>,
    status: StatusMode,
    terms: Mutex<Vec<String>>,
    added: Mutex<Vec<AddMovieRequest>>,
}

#[async_trait::async_trait]
impl RadarrApi for FakeRadarr {
    async fn lookup_movies(&self, term: &str) -> ArrResult<Vec<MovieResource>> {
        self.terms.lock().unwrap().push(term.to_string());
        Ok(self.lookup.clone())
    }
    async fn lookup_movie_by_tmdb(&self, tmdb_id: i64) -> ArrResult<MovieResource> {
        self.catalog
            .get(&tmdb_id)
            .cloned()
            .ok_or_else(|| ArrError::NotFound {
                service: Service::Radarr,
                what: format!("TMDb id {tmdb_id}"),
            })
    }
    async fn find_movie(&self, tmdb_id: i64) -> ArrResult<Option<MovieResource>> {
        Ok(self
            .library
            .iter()
            .find(|m| m.tmdb_id == Some(tmdb_id))
            .cloned())
    }
    async fn add_movie(&self, request: &AddMovieRequest) -> ArrResult<MovieResource> {
        self.added.lock().unwrap().push(request.clone());
        Ok(MovieResource {
            id: Some(42),
            title: request.title.clone(),
            tmdb_id: Some(request.tmdb_id),
            ..MovieResource::default()
        })
    }
    async fn root_folders(&self) -> ArrResult<Vec<RootFolder>> {
        Ok(self.root_folders.clone())
    }
    async fn quality_profiles(&self) -> ArrResult<Vec<QualityProfile>> {
        Ok(vec![QualityProfile {
            id: 1,
            name: "Any".to_string(),
        }])
    }
    async fn system_status(&self) -> ArrResult<SystemStatus> {
        match self.status {
            StatusMode::Up => Ok(SystemStatus {
                app_name: Some("Radarr".to_string()),
                version: Some("5.2.6.8376".to_string()),
            }),
            StatusMode::BadKey => Err(ArrError::Unauthorized {
                service: Service::Radarr,
            }),
        }
    }
}

#[derive(Default)]
struct FakeSonarr {
    lookup: HashMap<String, Vec<SeriesResource>>,
    library: Vec<SeriesResource>,
    root_folders: Vec<RootFolder>,
    status: StatusMode,
    added: Mutex<Vec<AddSeriesRequest>>,
}

#[async_trait::async_trait]
impl SonarrApi for FakeSonarr {
    async fn lookup_series(&self, term: &str) -> ArrResult<Vec<SeriesResource>> {
        Ok(self.lookup.get(term).cloned().unwrap_or_default())
    }
    async fn find_series(&self, tvdb_id: i64) -> ArrResult<Option<SeriesResource>> {
        Ok(self
            .library
            .iter()
            .find(|s| s.tvdb_id == Some(tvdb_id))
            .cloned())
    }
    async fn add_series(&self, request: &AddSeriesRequest) -> ArrResult<SeriesResource> {
        self.added.lock().unwrap().push(request.clone());
        Ok(SeriesResource {
            id: Some(7),
            title: request.title.clone(),
            tvdb_id: Some(request.tvdb_id),
            ..SeriesResource::default()
        })
    }
    async fn root_folders(&self) -> ArrResult<Vec<RootFolder>> {
        Ok(self.root_folders.clone())
    }
    async fn quality_profiles(&self) -> ArrResult<Vec<QualityProfile>> {
        Ok(vec![QualityProfile {
            id: 4,
            name: "HD-1080p".to_string(),
        }])
    }
    async fn system_status(&self) -> ArrResult<SystemStatus> {
        match self.status {
            StatusMode::Up => Ok(SystemStatus {
                app_name: Some("Sonarr".to_string()),
                version: Some("4.0.1.929".to_string()),
            }),
            StatusMode::BadKey => Err(ArrError::Unauthorized {
                service: Service::Sonarr,
            }),
        }
    }
}

fn base_config() -> Config {
    Config::from_lookup(|_| None).expect("defaults are valid")
}

fn movie(title: &str, year: i32, tmdb_id: i64) -> MovieResource {
    MovieResource {
        title: title.to_string(),
        year: Some(year),
        overview: Some(format!("{title} overview")),
        tmdb_id: Some(tmdb_id),
        remote_poster: Some(format!("https://image.tmdb.org/{tmdb_id}.jpg")),
        ..MovieResource::default()
    }
}

fn series(title: &str, year: i32, tvdb_id: i64) -> SeriesResource {
    SeriesResource {
        title: title.to_string(),
        year: Some(year),
        tvdb_id: Some(tvdb_id),
        title_slug: Some(title.to_lowercase().replace(' ', "-")),
        ..SeriesResource::default()
    }
}

fn folder(path: &str, accessible: bool) -> RootFolder {
    RootFolder {
        path: path.to_string(),
        accessible: Some(accessible),
    }
}

fn tools_with(radarr: Option<Arc<FakeRadarr>>, sonarr: Option<Arc<FakeSonarr>>) -> Tools {
    tools_with_config(base_config(), radarr, sonarr)
}

fn tools_with_config(
    config: Config,
    radarr: Option<Arc<FakeRadarr>>,
    sonarr: Option<Arc<FakeSonarr>>,
) -> Tools {
    Tools::new(
        config,
        radarr.map(|r| r as Arc<dyn RadarrApi>),
        sonarr.map(|s| s as Arc<dyn SonarrApi>),
    )
}

#[tokio::test]
async fn every_tool_reports_missing_configuration() {
    let tools = tools_with(None, None);

    let kinds = [
        tools.search_movies("The Matrix").await.unwrap_err().kind(),
        tools.add_movie_by_id(603, None).await.unwrap_err().kind(),
        tools
            .search_and_add_show("Doctor Who", true)
            .await
            .unwrap_err()
            .kind(),
        tools
            .add_show_by_tvdb_id(78804, Some("Doctor Who"), None)
            .await
            .unwrap_err()
            .kind(),
        tools.get_server_status().await.unwrap_err().kind(),
    ];
    assert!(kinds.iter().all(|k| *k == ErrorKind::NotConfigured));

    let err = tools.search_movies("The Matrix").await.unwrap_err();
    assert!(err.to_string().contains("RADARR_API_KEY"));

    let report = tools.test_config().await;
    assert!(!report.radarr_api_key_set);
    assert_eq!(report.radarr.search_connectivity, Connectivity::NoApiKey);
    assert_eq!(report.sonarr.search_connectivity, Connectivity::NoApiKey);
}

#[tokio::test]
async fn movie_tools_work_without_sonarr() {
    let radarr = Arc::new(FakeRadarr::default());
    let tools = tools_with(Some(radarr), None);

    let res = tools.search_movies("Primer").await.unwrap();
    assert!(res.results.is_empty());
    assert_eq!(
        tools
            .add_show_by_tvdb_id(1, Some("x"), None)
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::NotConfigured
    );
}

#[tokio::test]
async fn search_without_matches_returns_empty_results() {
    let tools = tools_with(Some(Arc::new(FakeRadarr::default())), None);

    let res = tools.search_movies("  zzzz no such film  ").await.unwrap();
    assert_eq!(res.total_found, 0);
    assert!(res.results.is_empty());
    assert_eq!(res.searched_query, "zzzz no such film");
    assert!(res.message.unwrap().contains("No movies found"));
}

#[tokio::test]
async fn search_rejects_blank_title() {
    let tools = tools_with(Some(Arc::new(FakeRadarr::default())), None);
    let err = tools.search_movies("   ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn search_maps_candidates_and_flags_library_entries() {
    let mut owned = movie("The Matrix", 1999, 603);
    owned.id = Some(12);
    let radarr = Arc::new(FakeRadarr {
        lookup: vec![
            owned,
            movie("The Matrix Reloaded", 2003, 604),
            MovieResource {
                title: "No catalog id".to_string(),
                ..MovieResource::default()
            },
        ],
        ..FakeRadarr::default()
    });
    let tools = tools_with(Some(radarr.clone()), None);

    let res = tools.search_movies("tt0133093").await.unwrap();
    assert_eq!(radarr.terms.lock().unwrap().as_slice(), ["imdb:tt0133093"]);
    assert_eq!(res.total_found, 2);
    assert!(res.message.is_none());
    assert_eq!(res.results[0].tmdb_id, 603);
    assert!(res.results[0].already_added);
    assert_eq!(res.results[0].library_id, Some(12));
    assert!(!res.results[1].already_added);
    assert_eq!(res.results[1].year, Some(2003));
}

#[tokio::test]
async fn search_caps_movie_results() {
    let radarr = Arc::new(FakeRadarr {
        lookup: (1..=25).map(|i| movie(&format!("Film {i}"), 2000, i)).collect(),
        ..FakeRadarr::default()
    });
    let tools = tools_with(Some(radarr), None);
    let res = tools.search_movies("Film").await.unwrap();
    assert_eq!(res.results.len(), 10);
    assert_eq!(res.total_found, 10);
}

#[tokio::test]
async fn add_movie_submits_confirmed_catalog_entry() {
    let radarr = Arc::new(FakeRadarr {
        catalog: HashMap::from([(14337, movie("Primer", 2004, 14337))]),
        ..FakeRadarr::default()
    });
    let config = Config {
        quality_profile_id: 6,
        radarr_root_folder: Some("/storage/movies".to_string()),
        ..base_config()
    };
    let tools = tools_with_config(config, Some(radarr.clone()), None);

    let res = tools.add_movie_by_id(14337, None).await.unwrap();
    assert!(res.success);
    assert_eq!(res.media_id, Some(42));
    assert_eq!(res.title.as_deref(), Some("Primer"));
    assert_eq!(res.root_folder.as_deref(), Some("/storage/movies"));

    let added = radarr.added.lock().unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].title, "Primer");
    assert_eq!(added[0].year, Some(2004));
    assert_eq!(added[0].quality_profile_id, 6);
    assert_eq!(added[0].minimum_availability, "announced");
    assert!(added[0].monitored);
    assert!(added[0].add_options.search_for_movie);
}

#[tokio::test]
async fn add_movie_root_folder_precedence() {
    let radarr = Arc::new(FakeRadarr {
        catalog: HashMap::from([(1, movie("One", 2001, 1)), (2, movie("Two", 2002, 2))]),
        root_folders: vec![folder("/offline", false), folder("/media/films", true)],
        ..FakeRadarr::default()
    });
    let config = Config {
        radarr_root_folder: None,
        ..base_config()
    };
    let tools = tools_with_config(config, Some(radarr.clone()), None);

    let explicit = tools.add_movie_by_id(1, Some("/storage/4k")).await.unwrap();
    assert_eq!(explicit.root_folder.as_deref(), Some("/storage/4k"));

    let detected = tools.add_movie_by_id(2, None).await.unwrap();
    assert_eq!(detected.root_folder.as_deref(), Some("/media/films"));
}

#[tokio::test]
async fn add_movie_without_any_root_folder_fails() {
    let radarr = Arc::new(FakeRadarr {
        catalog: HashMap::from([(1, movie("One", 2001, 1))]),
        ..FakeRadarr::default()
    });
    let tools = tools_with(Some(radarr.clone()), None);

    let err = tools.add_movie_by_id(1, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConfigured);
    assert!(radarr.added.lock().unwrap().is_empty());
}

#[tokio::test]
async fn add_movie_is_idempotent_for_library_entries() {
    let mut owned = movie("The Matrix", 1999, 603);
    owned.id = Some(12);
    let radarr = Arc::new(FakeRadarr {
        library: vec![owned.clone()],
        catalog: HashMap::from([(603, owned)]),
        root_folders: vec![folder("/movies", true)],
        ..FakeRadarr::default()
    });
    let tools = tools_with(Some(radarr.clone()), None);

    for _ in 0..2 {
        let err = tools.add_movie_by_id(603, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
        assert!(matches!(
            err,
            ArrError::Duplicate {
                library_id: Some(12),
                ..
            }
        ));
    }
    assert!(radarr.added.lock().unwrap().is_empty());
}

#[tokio::test]
async fn add_movie_rejects_unknown_and_invalid_ids() {
    let radarr = Arc::new(FakeRadarr {
        root_folders: vec![folder("/movies", true)],
        ..FakeRadarr::default()
    });
    let tools = tools_with(Some(radarr.clone()), None);

    let missing = tools.add_movie_by_id(999_999, None).await.unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
    let invalid = tools.add_movie_by_id(0, None).await.unwrap_err();
    assert_eq!(invalid.kind(), ErrorKind::InvalidInput);
    assert!(radarr.added.lock().unwrap().is_empty());
}

#[tokio::test]
async fn auto_add_show_when_single_candidate() {
    let primeval = series("Primeval", 2007, 80327);
    let sonarr = Arc::new(FakeSonarr {
        lookup: HashMap::from([
            (
                "british dinosaur anomaly show".to_string(),
                vec![primeval.clone()],
            ),
            ("tvdb:80327".to_string(), vec![primeval]),
        ]),
        root_folders: vec![folder("/tv", true)],
        ..FakeSonarr::default()
    });
    let config = Config {
        sonarr_language_profile_id: Some(1),
        ..base_config()
    };
    let tools = tools_with_config(config, None, Some(sonarr.clone()));

    let res = tools
        .search_and_add_show("british dinosaur anomaly show", true)
        .await
        .unwrap();
    assert_eq!(res.results.len(), 1);
    let added = res.added.expect("show should be added");
    assert!(added.success);
    assert_eq!(added.media_id, Some(7));

    let requests = sonarr.added.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].tvdb_id, 80327);
    assert_eq!(requests[0].title_slug.as_deref(), Some("primeval"));
    assert_eq!(requests[0].language_profile_id, Some(1));
    assert!(requests[0].season_folder);
    assert!(requests[0].add_options.search_for_missing_episodes);
    assert_eq!(requests[0].root_folder_path, "/tv");
}

#[tokio::test]
async fn auto_add_confirms_exact_title_among_many() {
    let who = series("Doctor Who", 2005, 78804);
    let sonarr = Arc::new(FakeSonarr {
        lookup: HashMap::from([
            (
                "Doctor Who".to_string(),
                vec![who.clone(), series("Doctor Who Confidential", 2005, 79552)],
            ),
            ("tvdb:78804".to_string(), vec![who]),
        ]),
        root_folders: vec![folder("/tv", true)],
        ..FakeSonarr::default()
    });
    let tools = tools_with(None, Some(sonarr.clone()));

    let res = tools.search_and_add_show("Doctor Who", true).await.unwrap();
    assert_eq!(res.results.len(), 2);
    assert!(res.added.is_some());
    assert_eq!(sonarr.added.lock().unwrap()[0].tvdb_id, 78804);
}

#[tokio::test]
async fn ambiguous_search_does_not_add() {
    let sonarr = Arc::new(FakeSonarr {
        lookup: HashMap::from([(
            "time travel".to_string(),
            vec![
                series("Doctor Who", 2005, 78804),
                series("Timeless", 2016, 311000),
            ],
        )]),
        root_folders: vec![folder("/tv", true)],
        ..FakeSonarr::default()
    });
    let tools = tools_with(None, Some(sonarr.clone()));

    let res = tools.search_and_add_show("time travel", true).await.unwrap();
    assert_eq!(res.total_found, 2);
    assert!(res.added.is_none());
    assert!(res.message.unwrap().contains("add_show_by_tvdb_id"));
    assert!(sonarr.added.lock().unwrap().is_empty());
}

#[tokio::test]
async fn search_without_auto_add_only_lists() {
    let sonarr = Arc::new(FakeSonarr {
        lookup: HashMap::from([("Primeval".to_string(), vec![series("Primeval", 2007, 80327)])]),
        root_folders: vec![folder("/tv", true)],
        ..FakeSonarr::default()
    });
    let tools = tools_with(None, Some(sonarr.clone()));

    let res = tools.search_and_add_show("Primeval", false).await.unwrap();
    assert_eq!(res.results.len(), 1);
    assert!(res.added.is_none());
    assert!(sonarr.added.lock().unwrap().is_empty());

    let empty = tools.search_and_add_show("nothing like this", true).await.unwrap();
    assert!(empty.results.is_empty());
    assert!(empty.message.unwrap().contains("No shows found"));
}

#[tokio::test]
async fn auto_add_skips_shows_already_in_library() {
    let mut owned = series("Primeval", 2007, 80327);
    owned.id = Some(3);
    let sonarr = Arc::new(FakeSonarr {
        lookup: HashMap::from([("Primeval".to_string(), vec![owned.clone()])]),
        library: vec![owned],
        root_folders: vec![folder("/tv", true)],
        ..FakeSonarr::default()
    });
    let tools = tools_with(None, Some(sonarr.clone()));

    let res = tools.search_and_add_show("Primeval", true).await.unwrap();
    assert!(res.results[0].already_added);
    assert!(res.added.is_none());
    assert!(res.message.unwrap().contains("already in Sonarr"));
    assert!(sonarr.added.lock().unwrap().is_empty());
}

#[tokio::test]
async fn add_show_is_idempotent_for_library_entries() {
    let mut owned = series("Primeval", 2007, 80327);
    owned.id = Some(3);
    let sonarr = Arc::new(FakeSonarr {
        library: vec![owned],
        root_folders: vec![folder("/tv", true)],
        ..FakeSonarr::default()
    });
    let tools = tools_with(None, Some(sonarr.clone()));

    let err = tools
        .add_show_by_tvdb_id(80327, Some("Primeval"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Duplicate);
    assert!(sonarr.added.lock().unwrap().is_empty());
}

#[tokio::test]
async fn add_show_falls_back_to_given_title() {
    let sonarr = Arc::new(FakeSonarr {
        root_folders: vec![folder("/tv", true)],
        ..FakeSonarr::default()
    });
    let config = Config {
        sonarr_root_folder: Some("/storage/anime".to_string()),
        ..base_config()
    };
    let tools = tools_with_config(config, None, Some(sonarr.clone()));

    let res = tools
        .add_show_by_tvdb_id(123456, Some("Obscure Anime"), None)
        .await
        .unwrap();
    assert!(res.success);
    assert_eq!(res.root_folder.as_deref(), Some("/storage/anime"));
    assert_eq!(sonarr.added.lock().unwrap()[0].title, "Obscure Anime");

    let err = tools.add_show_by_tvdb_id(654321, None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn add_show_prefers_catalog_title() {
    let sonarr = Arc::new(FakeSonarr {
        lookup: HashMap::from([(
            "tvdb:78804".to_string(),
            vec![series("Doctor Who", 2005, 78804)],
        )]),
        root_folders: vec![folder("/tv", true)],
        ..FakeSonarr::default()
    });
    let tools = tools_with(None, Some(sonarr.clone()));

    let res = tools
        .add_show_by_tvdb_id(78804, Some("dr who"), Some("/storage/tv"))
        .await
        .unwrap();
    assert_eq!(res.title.as_deref(), Some("Doctor Who"));
    assert_eq!(res.root_folder.as_deref(), Some("/storage/tv"));
    assert_eq!(sonarr.added.lock().unwrap()[0].year, Some(2005));
}

#[tokio::test]
async fn server_status_distinguishes_auth_failures() {
    let radarr = Arc::new(FakeRadarr::default());
    let sonarr = Arc::new(FakeSonarr {
        status: StatusMode::BadKey,
        ..FakeSonarr::default()
    });
    let tools = tools_with(Some(radarr), Some(sonarr));

    let report = tools.get_server_status().await.unwrap();
    assert!(report.radarr.reachable);
    assert!(report.radarr.authenticated);
    assert_eq!(report.radarr.version.as_deref(), Some("5.2.6.8376"));
    assert!(report.sonarr.reachable);
    assert!(!report.sonarr.authenticated);
    assert!(report.sonarr.error.unwrap().contains("authentication failed"));
    assert!(chrono::DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
}

#[tokio::test]
async fn server_status_reports_unconfigured_service() {
    let tools = tools_with(
        Some(Arc::new(FakeRadarr {
            status: StatusMode::BadKey,
            ..FakeRadarr::default()
        })),
        None,
    );

    let report = tools.get_server_status().await.unwrap();
    assert!(!report.radarr.authenticated);
    assert!(!report.sonarr.configured);
    assert!(!report.sonarr.reachable);
    assert!(report.sonarr.error.unwrap().contains("SONARR_API_KEY"));
}

#[tokio::test]
async fn test_config_checks_quality_profile() {
    let config = Config {
        radarr_api_key: Some("r".to_string()),
        sonarr_api_key: Some("s".to_string()),
        quality_profile_id: 4,
        ..base_config()
    };
    let tools = tools_with_config(
        config,
        Some(Arc::new(FakeRadarr {
            lookup: vec![movie("Test Pattern", 2019, 1)],
            ..FakeRadarr::default()
        })),
        Some(Arc::new(FakeSonarr::default())),
    );

    let report = tools.test_config().await;
    assert!(report.radarr_api_key_set && report.sonarr_api_key_set);
    assert_eq!(report.radarr.search_connectivity, Connectivity::Success);
    assert_eq!(report.radarr.test_results, Some(1));
    assert_eq!(report.radarr.quality_profile_found, Some(false));
    assert_eq!(report.radarr.quality_profile_name, None);
    assert_eq!(report.sonarr.test_results, Some(0));
    assert_eq!(report.sonarr.quality_profile_found, Some(true));
    assert_eq!(report.sonarr.quality_profile_name.as_deref(), Some("HD-1080p"));
}
