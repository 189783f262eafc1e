//! Runtime configuration, read once from the environment at startup.
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

const DEFAULT_RADARR_URL: &str = "http://localhost:7878";
const DEFAULT_SONARR_URL: &str = "http://localhost:8989";
const DEFAULT_BIND: &str = "127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive whole number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be an absolute http(s) URL, got '{value}'")]
    InvalidUrl { key: &'static str, value: String },

    #[error("MCP_TRANSPORT must be 'stdio' or 'http', got '{0}'")]
    UnknownTransport(String),

    #[error("MCP_BIND must be a socket address such as 127.0.0.1:8000, got '{0}'")]
    InvalidBind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "http" => Ok(Transport::Http),
            other => Err(ConfigError::UnknownTransport(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub transport: Transport,
    pub bind: SocketAddr,
    /// Bearer token required on the HTTP transport when set.
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub radarr_url: String,
    pub radarr_api_key: Option<String>,
    pub sonarr_url: String,
    pub sonarr_api_key: Option<String>,
    pub tvdb_api_key: Option<String>,
    pub quality_profile_id: i32,
    pub radarr_root_folder: Option<String>,
    pub sonarr_root_folder: Option<String>,
    pub sonarr_language_profile_id: Option<i32>,
    pub request_timeout: Duration,
    pub server: ServerSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let radarr_url = parse_url(
            "RADARR_URL",
            get("RADARR_URL").as_deref().unwrap_or(DEFAULT_RADARR_URL),
        )?;
        let sonarr_url = parse_url(
            "SONARR_URL",
            get("SONARR_URL").as_deref().unwrap_or(DEFAULT_SONARR_URL),
        )?;

        let quality_profile_id = match get("QUALITY_PROFILE_ID") {
            Some(v) => parse_id("QUALITY_PROFILE_ID", &v)?,
            None => 1,
        };
        let sonarr_language_profile_id = get("SONARR_LANGUAGE_PROFILE_ID")
            .map(|v| parse_id("SONARR_LANGUAGE_PROFILE_ID", &v))
            .transpose()?;
        let timeout_secs: u64 = match get("ARR_TIMEOUT_SECS") {
            Some(v) => parse_number("ARR_TIMEOUT_SECS", &v)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let transport = match get("MCP_TRANSPORT") {
            Some(v) => v.parse()?,
            None => Transport::Stdio,
        };
        let bind_raw = get("MCP_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBind(bind_raw.clone()))?;

        Ok(Self {
            radarr_url,
            radarr_api_key: get("RADARR_API_KEY"),
            sonarr_url,
            sonarr_api_key: get("SONARR_API_KEY"),
            tvdb_api_key: get("TVDB_API_KEY"),
            quality_profile_id,
            radarr_root_folder: get("RADARR_ROOT_FOLDER"),
            sonarr_root_folder: get("SONARR_ROOT_FOLDER"),
            sonarr_language_profile_id,
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
            server: ServerSettings {
                transport,
                bind,
                auth_token: get("MCP_AUTH_TOKEN"),
            },
        })
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        key,
        value: value.to_string(),
    };
    let url = Url::parse(value).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}

/// Backend profile ids start at 1.
fn parse_id(key: &'static str, value: &str) -> Result<i32, ConfigError> {
    let id: i32 = parse_number(key, value)?;
    if id <= 0 {
        return Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        });
    }
    Ok(id)
}
