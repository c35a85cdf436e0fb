// ⚙️ Configuration - defaults → JSON file → environment
// CLI flags are applied on top by the binaries.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Hard cap of the listing (first generation)
pub const MAX_LISTING: usize = 151;

pub const DEFAULT_API_URL: &str = "https://pokeapi.co/api/v2";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the API, without trailing slash
    pub api_base_url: String,

    /// Number of entries requested from the listing endpoint (1..=151)
    pub listing_limit: usize,

    pub user_agent: String,

    /// Per-request timeout; `None` waits forever
    pub request_timeout_secs: Option<u64>,

    /// Bind address of pokedex-server
    pub server_addr: String,

    /// Where the TUI writes its log file
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_URL.to_string(),
            listing_limit: MAX_LISTING,
            user_agent: format!("pokedex/{}", crate::VERSION),
            request_timeout_secs: None,
            server_addr: "0.0.0.0:3000".to_string(),
            log_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load config from a JSON file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        Ok(config.normalized())
    }

    /// Resolve the effective config.
    ///
    /// `path` wins over `POKEDEX_CONFIG`; env overrides
    /// (`POKEDEX_API_URL`, `POKEDEX_LIMIT`, `POKEDEX_SERVER_ADDR`) win over the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os("POKEDEX_CONFIG").map(PathBuf::from));

        let config = match file {
            Some(file) => Self::from_file(file)?,
            None => Config::default(),
        };

        config.with_overrides(|key| env::var(key).ok())
    }

    /// Apply `POKEDEX_*` overrides read through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("POKEDEX_API_URL") {
            self.api_base_url = url;
        }
        if let Some(limit) = lookup("POKEDEX_LIMIT") {
            self.listing_limit = limit
                .trim()
                .parse()
                .with_context(|| format!("POKEDEX_LIMIT is not a number: {:?}", limit))?;
        }
        if let Some(addr) = lookup("POKEDEX_SERVER_ADDR") {
            self.server_addr = addr;
        }

        Ok(self.normalized())
    }

    pub fn with_api_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.api_base_url = url;
        }
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        self.listing_limit = self.listing_limit.clamp(1, MAX_LISTING);
        let trimmed = self.api_base_url.trim_end_matches('/').len();
        self.api_base_url.truncate(trimmed);
        self
    }
}
