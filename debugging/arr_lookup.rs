//! Run a Radarr/Sonarr lookup and print the candidates the tools would see.
//! Usage:
//!   cargo run --bin arr_lookup -- movie <term>
//!   cargo run --bin arr_lookup -- show <term>
//! Reads the same environment as the server (.env supported).

use anyhow::{Context, Result};
use arrlink::config::Config;
use arrlink::models::{MovieCandidate, ShowCandidate};
use arrlink::radarr::{RadarrApi, RadarrClient};
use arrlink::resolve;
use arrlink::sonarr::{SonarrApi, SonarrClient};
use dotenvy::dotenv;
use serde_json::json;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
enum MediaKind {
    Movie,
    Show,
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(MediaKind::Movie),
            "show" | "tv" => Ok(MediaKind::Show),
            _ => Err(anyhow::anyhow!("media kind must be 'movie' or 'show'")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let mut args = env::args().skip(1);
    let kind: MediaKind = args
        .next()
        .context("usage: arr_lookup <movie|show> <term>")?
        .parse()?;
    let query = args.collect::<Vec<_>>().join(" ");
    anyhow::ensure!(!query.trim().is_empty(), "usage: arr_lookup <movie|show> <term>");

    let config = Config::from_env()?;
    let output = match kind {
        MediaKind::Movie => {
            let key = config
                .radarr_api_key
                .as_deref()
                .context("RADARR_API_KEY not set")?;
            let client = RadarrClient::new(&config.radarr_url, key, config.request_timeout)?;
            let term = resolve::movie_lookup_term(&query);
            let candidates: Vec<MovieCandidate> = client
                .lookup_movies(&term)
                .await?
                .into_iter()
                .filter_map(MovieCandidate::from_resource)
                .collect();
            let confirmed = resolve::confirm_match(&query, &candidates);
            json!({ "term": term, "confirmed": confirmed, "candidates": candidates })
        }
        MediaKind::Show => {
            let key = config
                .sonarr_api_key
                .as_deref()
                .context("SONARR_API_KEY not set")?;
            let client = SonarrClient::new(&config.sonarr_url, key, config.request_timeout)?;
            let term = resolve::show_lookup_term(&query);
            let candidates: Vec<ShowCandidate> = client
                .lookup_series(&term)
                .await?
                .into_iter()
                .map(ShowCandidate::from)
                .collect();
            let confirmed = resolve::confirm_match(&query, &candidates);
            json!({ "term": term, "confirmed": confirmed, "candidates": candidates })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
