use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::{debug, info};

/// Default timeout for calls to Airtable.
pub const DEFAULT_AIRTABLE_TIMEOUT_SECS: u64 = 10;

pub const AIRTABLE_API_KEY_VAR: &str = "AIRTABLE_API_KEY";
pub const AIRTABLE_API_URL_VAR: &str = "AIRTABLE_API_URL";
pub const AIRTABLE_TIMEOUT_VAR: &str = "AIRTABLE_TIMEOUT_SECS";

/// Startup configuration, built once and handed to the loader and the server.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub workbook_path: PathBuf,
    pub bind: SocketAddr,
    pub static_dir: Option<PathBuf>,
    pub airtable: Option<AirtableConfig>,
}

impl Config {
    pub fn new(database_path: impl Into<PathBuf>, workbook_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            workbook_path: workbook_path.into(),
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            static_dir: None,
            airtable: None,
        }
    }

    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_static_dir(mut self, static_dir: Option<PathBuf>) -> Self {
        self.static_dir = static_dir;
        self
    }

    pub fn with_airtable(mut self, airtable: Option<AirtableConfig>) -> Self {
        self.airtable = airtable;
        self
    }

    pub fn trace_loaded(&self) {
        info!(
            database = %self.database_path.display(),
            workbook = %self.workbook_path.display(),
            bind = %self.bind,
            airtable = self.airtable.is_some(),
            "configuration loaded"
        );
        debug!(static_dir = ?self.static_dir, "static assets");
    }
}

/// Credentials and endpoint of the Airtable table receiving results.
#[derive(Clone)]
pub struct AirtableConfig {
    pub api_key: String,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for AirtableConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AirtableConfig {
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: api_url.into(),
            timeout_secs: DEFAULT_AIRTABLE_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Reads the Airtable settings from the process environment. Returns
    /// `None` when the key or the URL is unset or blank.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = non_blank(AIRTABLE_API_KEY_VAR)?;
        let api_url = non_blank(AIRTABLE_API_URL_VAR)?;
        let timeout_secs = non_blank(AIRTABLE_TIMEOUT_VAR)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(DEFAULT_AIRTABLE_TIMEOUT_SECS);

        Some(Self {
            api_key: api_key.trim().to_string(),
            api_url: api_url.trim().to_string(),
            timeout_secs,
        })
    }
}
