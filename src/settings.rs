use std::path::PathBuf;

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, Map};
use log::{debug, warn};
use serde::Deserialize;

pub const DEFAULT_API_ENDPOINT: &str = "https://api.scrapingdog.com/scrape";
pub const DEFAULT_SEARCH_URL: &str = "https://www.indeed.com/cmp/Bill-of-Rights-Institute/jobs";
/// Older deployments keep the key here; `SCRAPER_API_KEY` wins when both are set.
pub const LEGACY_API_KEY_VAR: &str = "SOME_SECRET";

/// Runtime settings, read once at startup and handed to the pipeline.
///
/// Every field maps to a `SCRAPER_*` environment variable, e.g. `SCRAPER_API_KEY`.
/// A `.env` file in the working directory is loaded first.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.into()
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.into()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_concurrency() -> usize {
    4
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => warn!("Ignoring unreadable .env file: {}", e),
        }
        Self::from_vars(std::env::vars())
    }

    /// Builds settings from an explicit set of variables instead of the process environment.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Map<String, String> = vars.into_iter().collect();
        let mut builder = Config::builder();
        if let Some(key) = vars.get(LEGACY_API_KEY_VAR) {
            builder = builder.set_default("api_key", key.as_str())?;
        }
        // Values stay strings so keys like "000123" survive intact.
        Self::from_builder(builder.add_source(Environment::with_prefix("SCRAPER").source(Some(vars))))
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let conf = builder.build()?;
        let mut s: Settings = conf.try_deserialize()?;
        if s.api_key.as_deref().map_or(false, |k| k.trim().is_empty()) {
            s.api_key = None;
        }
        s.concurrency = s.concurrency.max(1);
        Ok(s)
    }
}
