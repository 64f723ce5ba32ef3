//! # scholar-ingest
//!
//! Google Scholar ingestion through SerpApi: paginated search with retries,
//! tolerant normalization of result items into articles and authors, author
//! enrichment with citation metrics, and structured issues for everything that
//! was missing or failed along the way.
//!
//! ## Modules
//!
//! - [`transport`] - HTTP GET with linear retry backoff
//! - [`extract`] - Author and article extraction strategies
//! - [`keywords`] - Frequency-based keyword heuristic
//! - [`enrich`] - Author-detail lookups
//! - [`pipeline`] - Pagination and issue tracking
//! - [`store`] - SQLite persistence
//! - [`render`] - Console output
//! - [`config`] - Pipeline configuration
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scholar_ingest::{config::Config, pipeline::ScholarPipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = ScholarPipeline::from_config(Config::from_env()?);
//!     let harvest = pipeline.fetch_top("Jane Doe", 3).await;
//!     println!("{} articles, {} issues", harvest.records.len(), harvest.issues.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod keywords;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod store;
pub mod transport;

pub use error::{IngestError, Result};
