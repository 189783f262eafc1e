//! HTTP plumbing shared by the Radarr and Sonarr v3 clients.
use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ArrError, ArrResult};

const API_KEY_HEADER: &str = "X-Api-Key";
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Radarr,
    Sonarr,
}

impl Service {
    pub fn api_key_var(self) -> &'static str {
        match self {
            Service::Radarr => "RADARR_API_KEY",
            Service::Sonarr => "SONARR_API_KEY",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Radarr => f.write_str("Radarr"),
            Service::Sonarr => f.write_str("Sonarr"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootFolder {
    pub path: String,
    #[serde(default)]
    pub accessible: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QualityProfile {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Picks the first root folder the backend reports as accessible, falling back to the first one.
pub fn pick_root_folder(folders: &[RootFolder]) -> Option<&RootFolder> {
    folders
        .iter()
        .find(|f| f.accessible != Some(false))
        .or_else(|| folders.first())
}

#[derive(Debug, Clone)]
pub(crate) struct ArrHttp {
    client: Client,
    base_url: String,
    api_key: String,
    service: Service,
}

impl ArrHttp {
    pub(crate) fn new(
        service: Service,
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> ArrResult<Self> {
        let user_agent = format!("arrlink/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|source| ArrError::HttpClient { service, source })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            service,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v3/{}", self.base_url, path)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ArrResult<T> {
        let req = self.client.get(self.url(path));
        self.send(req, path).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> ArrResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.client.post(self.url(path)).json(body);
        self.send(req, path).await
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, path: &str) -> ArrResult<T> {
        let service = self.service;
        let res = req
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|source| {
                warn!("{} request to {} failed: {}", service, path, source);
                ArrError::Unreachable { service, source }
            })?;
        let status = res.status();
        debug!("{} {} -> {}", service, path, status);
        let text = res
            .text()
            .await
            .map_err(|source| ArrError::Unreachable { service, source })?;
        if !status.is_success() {
            return Err(status_error(service, status, path, &text));
        }
        serde_json::from_str(&text).map_err(|source| ArrError::Decode {
            service,
            path: path.to_string(),
            source,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidationFailure {
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

fn status_error(service: Service, status: StatusCode, path: &str, body: &str) -> ArrError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            warn!("{} rejected the API key", service);
            ArrError::Unauthorized { service }
        }
        StatusCode::NOT_FOUND => ArrError::NotFound {
            service,
            what: path.split('?').next().unwrap_or(path).to_string(),
        },
        _ => {
            let failures: Vec<ValidationFailure> = serde_json::from_str(body).unwrap_or_default();
            let exists = failures.iter().any(|f| {
                f.error_code
                    .as_deref()
                    .is_some_and(|c| c.ends_with("ExistsValidator"))
                    || f.error_message
                        .as_deref()
                        .is_some_and(|m| m.contains("already been added"))
            });
            if exists {
                return ArrError::Duplicate {
                    service,
                    what: "this entry".to_string(),
                    library_id: None,
                };
            }
            let message = if failures.is_empty() {
                truncate(body.trim(), MAX_ERROR_BODY_CHARS)
            } else {
                failures
                    .into_iter()
                    .filter_map(|f| f.error_message)
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            ArrError::Backend {
                service,
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
