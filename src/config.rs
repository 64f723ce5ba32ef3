//! Pipeline configuration.
//!
//! The API key is validated once when the configuration is built and is
//! immutable afterwards; business logic never reads the environment itself.

use crate::error::{IngestError, Result};
use crate::transport::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the SerpApi key
pub const API_KEY_VAR: &str = "SERPAPI_KEY";

/// Optional override of the search endpoint
pub const SEARCH_BASE_VAR: &str = "SCHOLAR_SEARCH_BASE";

/// Optional override of the profile URL prefix
pub const PROFILE_BASE_VAR: &str = "SCHOLAR_PROFILE_BASE";

/// Optional SQLite database path
pub const DB_PATH_VAR: &str = "SCHOLAR_DB";

/// Default SerpApi search endpoint
pub const DEFAULT_SEARCH_BASE: &str = "https://serpapi.com/search.json";

/// Prefix of a Google Scholar profile; the author id is appended
pub const DEFAULT_PROFILE_BASE: &str = "https://scholar.google.com/citations?user=";

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct Config {
    api_key: String,
    /// Search endpoint shared by both engines
    pub search_base: String,
    /// Profile URL prefix used to derive `AuthorRecord::profile_url`
    pub profile_base: String,
    /// Engine for article searches
    pub engine: String,
    /// Engine for author-detail lookups
    pub author_engine: String,
    /// Results requested per page
    pub page_size: usize,
    /// Page-count ceiling per operation
    pub max_pages: usize,
    /// Transport retry policy
    pub retry: RetryPolicy,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Config {
    /// Build a configuration with defaults around `api_key`.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Config` if the key is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(IngestError::Config(format!(
                "Missing {} environment variable.",
                API_KEY_VAR
            )));
        }

        Ok(Self {
            api_key,
            search_base: DEFAULT_SEARCH_BASE.to_string(),
            profile_base: DEFAULT_PROFILE_BASE.to_string(),
            engine: "google_scholar".to_string(),
            author_engine: "google_scholar_author".to_string(),
            page_size: 10,
            max_pages: 3,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(30),
        })
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR).unwrap_or_default();
        let mut config = Self::new(api_key)?;

        if let Ok(base) = std::env::var(SEARCH_BASE_VAR) {
            config.search_base = base;
        }
        if let Ok(base) = std::env::var(PROFILE_BASE_VAR) {
            config.profile_base = base;
        }

        Ok(config)
    }

    /// Point both engines at another endpoint (mirrors, test servers).
    pub fn with_search_base(mut self, base: impl Into<String>) -> Self {
        self.search_base = base.into();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Search URL for one page of results
    pub fn search_url(&self, query: &str, start: usize) -> String {
        format!(
            "{}?engine={}&q={}&hl=en&num={}&start={}&api_key={}",
            self.search_base,
            self.engine,
            urlencoding::encode(query),
            self.page_size,
            start,
            urlencoding::encode(&self.api_key)
        )
    }

    /// Author-detail URL for a Scholar author id
    pub fn author_url(&self, author_id: &str) -> String {
        format!(
            "{}?engine={}&author_id={}&hl=en&api_key={}",
            self.search_base,
            self.author_engine,
            urlencoding::encode(author_id),
            urlencoding::encode(&self.api_key)
        )
    }

    /// Profile URL derived from an author id
    pub fn profile_url(&self, author_id: &str) -> String {
        format!("{}{}", self.profile_base, author_id)
    }
}

/// Resolve the SQLite path: explicit flag, then `SCHOLAR_DB`, then `~/.scholar_ingest.db`.
pub fn database_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var(DB_PATH_VAR).ok().map(PathBuf::from))
        .or_else(|| dirs::home_dir().map(|p| p.join(".scholar_ingest.db")))
        .unwrap_or_else(|| PathBuf::from(".scholar_ingest.db"))
}
