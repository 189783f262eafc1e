pub mod app;
pub mod arr;
pub mod config;
pub mod error;
pub mod mcp;
pub mod models;
pub mod radarr;
pub mod resolve;
pub mod sonarr;
pub mod tools;
