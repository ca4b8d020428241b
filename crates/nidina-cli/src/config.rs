//! Environment-driven configuration.
//!
//! # Environment Variables
//!
//! - `NIDINA_HOST`: server bind address (default: `0.0.0.0`)
//! - `NIDINA_PORT`: server port (default: `5001`)
//! - `NIDINA_TASKS_FILE`: JSON file backing the store (default: `tasks.json`)
//! - `NIDINA_API_URL`: server the client subcommands talk to (default: `http://localhost:5001`)
//! - `RUST_LOG`: log filter

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_TASKS_FILE: &str = "tasks.json";
pub const DEFAULT_API_URL: &str = "http://localhost:5001";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tasks_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tasks_file: PathBuf::from(DEFAULT_TASKS_FILE),
        }
    }
}

impl ServerConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Unset and empty
    /// variables fall back to the defaults.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let port = match var("NIDINA_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|error| ConfigurationError::InvalidValue {
                    name: "NIDINA_PORT",
                    value: raw.clone(),
                    reason: error.to_string(),
                })?,
            None => defaults.port,
        };

        Ok(Self {
            host: var("NIDINA_HOST").unwrap_or(defaults.host),
            port,
            tasks_file: var("NIDINA_TASKS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.tasks_file),
        })
    }

    pub fn address(&self) -> Result<SocketAddr, ConfigurationError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse()
            .map_err(|error: std::net::AddrParseError| ConfigurationError::InvalidValue {
                name: "NIDINA_HOST",
                value: self.host.clone(),
                reason: error.to_string(),
            })
    }
}
