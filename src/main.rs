//! scholar-ingest - Google Scholar article and author ingestion
//!
//! Fetches results through SerpApi, stores them in SQLite and reports every
//! data-quality issue met along the way.
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! scholar-ingest articles "Jane Doe" "John Roe" --limit 3
//! scholar-ingest authors deep learning for proteins
//! scholar-ingest show authors
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! scholar-ingest serve --port 3000
//! ```

use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use scholar_ingest::{
    config::{self, Config},
    models::{ArticleRecord, AuthorRecord, Harvest, Issue},
    pipeline::ScholarPipeline,
    render,
    store::{Database, RecordStore},
    transport::HttpTransport,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Google Scholar ingestion pipeline
#[derive(Parser)]
#[command(name = "scholar-ingest")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// SQLite database path (default: $SCHOLAR_DB or ~/.scholar_ingest.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the top articles of one or more authors
    Articles {
        /// Author names, each searched separately
        #[arg(required = true)]
        authors: Vec<String>,

        /// Articles to keep per author
        #[arg(short, long, default_value = "3")]
        limit: usize,

        /// Also write the articles and issues as CSV into this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Find the first article matching a query and enrich its authors
    Authors {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Show what is stored in the database
    Show {
        #[arg(value_enum)]
        table: Table,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Table {
    Articles,
    Authors,
    Issues,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    let db_path = config::database_path(cli.db);

    match cli.command {
        Commands::Articles {
            authors,
            limit,
            export,
        } => run_articles(&db_path, authors, limit, export).await,
        Commands::Authors { query } => run_authors(&db_path, query.join(" ")).await,
        Commands::Show { table } => show(&db_path, table),
        Commands::Serve { port, host } => run_server(&db_path, host, port).await,
    }
}

fn build_pipeline() -> Result<ScholarPipeline<HttpTransport>> {
    let config = Config::from_env().context("Cannot start without a SerpApi key")?;
    Ok(ScholarPipeline::from_config(config))
}

/// Save records and issues of one operation; returns the number of new records
fn persist<R>(db: &Database, harvest: &Harvest<R>) -> Result<usize>
where
    Database: RecordStore<R>,
{
    let saved = <Database as RecordStore<R>>::save_all(db, &harvest.records)
        .context("Failed to save records")?;
    <Database as RecordStore<Issue>>::save_all(db, &harvest.issues)
        .context("Failed to save issues")?;
    Ok(saved)
}

// ============================================================================
// Commands
// ============================================================================

async fn run_articles(
    db_path: &Path,
    authors: Vec<String>,
    limit: usize,
    export: Option<PathBuf>,
) -> Result<()> {
    let pipeline = build_pipeline()?;
    let db = Database::open(db_path).context("Failed to open database")?;

    let mut all_records: Vec<ArticleRecord> = Vec::new();
    let mut all_issues: Vec<Issue> = Vec::new();

    // One operation per author; each harvest carries its own issues
    for author in &authors {
        let harvest = pipeline.fetch_top(author, limit).await;
        persist(&db, &harvest)?;
        all_records.extend(harvest.records);
        all_issues.extend(harvest.issues);
    }

    let mut out = std::io::stdout().lock();
    render::saved_notice(&mut out, "article", all_records.len())?;
    render::articles(&mut out, &all_records)?;
    render::issues(&mut out, &all_issues)?;

    if let Some(dir) = export {
        std::fs::create_dir_all(&dir).context("Failed to create export directory")?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        save_csv(&dir.join(format!("{}_articles.csv", stamp)), &all_records)?;
        save_csv(&dir.join(format!("{}_issues.csv", stamp)), &all_issues)?;
    }

    Ok(())
}

async fn run_authors(db_path: &Path, query: String) -> Result<()> {
    let pipeline = build_pipeline()?;
    let db = Database::open(db_path).context("Failed to open database")?;

    let harvest = pipeline.ingest_authors(&query).await;
    persist(&db, &harvest)?;

    let mut out = std::io::stdout().lock();
    render::saved_notice(&mut out, "author", harvest.records.len())?;
    render::authors(&mut out, &harvest.records)?;
    render::issues(&mut out, &harvest.issues)?;
    Ok(())
}

fn show(db_path: &Path, table: Table) -> Result<()> {
    let db = Database::open(db_path).context("Failed to open database")?;
    let mut out = std::io::stdout().lock();

    match table {
        Table::Articles => {
            let rows: Vec<ArticleRecord> = db.find_all()?;
            render::articles(&mut out, &rows)?;
        }
        Table::Authors => {
            let rows: Vec<AuthorRecord> = db.find_all()?;
            render::authors(&mut out, &rows)?;
        }
        Table::Issues => {
            let rows: Vec<Issue> = db.find_all()?;
            render::issues(&mut out, &rows)?;
        }
    }
    Ok(())
}

/// Save data to CSV file
fn save_csv<T: Serialize>(path: &Path, data: &[T]) -> Result<()> {
    if data.is_empty() {
        println!("No data to save to {:?}", path);
        return Ok(());
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context("Failed to create CSV writer")?;

    for item in data {
        wtr.serialize(item).context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV")?;
    println!("Saved: {:?}", path);
    Ok(())
}

// ============================================================================
// HTTP Server
// ============================================================================

struct AppState {
    pipeline: ScholarPipeline<HttpTransport>,
    db: Mutex<Database>,
}

async fn run_server(db_path: &Path, host: String, port: u16) -> Result<()> {
    info!(host = %host, port = port, "Starting HTTP server");

    let app_state = Arc::new(AppState {
        pipeline: build_pipeline()?,
        db: Mutex::new(Database::open(db_path).context("Failed to open database")?),
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/articles", post(articles_handler))
        .route("/authors", post(authors_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct ArticlesRequest {
    author: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    3
}

#[derive(Debug, Deserialize)]
struct AuthorsRequest {
    query: String,
}

type ApiResult<T> = std::result::Result<Json<Harvest<T>>, (StatusCode, String)>;

fn store_harvest<R>(state: &AppState, harvest: &Harvest<R>) -> std::result::Result<(), (StatusCode, String)>
where
    Database: RecordStore<R>,
{
    let db = state
        .db
        .lock()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "database lock poisoned".to_string()))?;
    persist(&db, harvest).map_err(|e| {
        error!(error = %e, "Persist failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(())
}

async fn articles_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ArticlesRequest>,
) -> ApiResult<ArticleRecord> {
    info!(author = %req.author, limit = req.limit, "Articles request");
    let harvest = state.pipeline.fetch_top(&req.author, req.limit).await;
    store_harvest(&state, &harvest)?;
    Ok(Json(harvest))
}

async fn authors_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AuthorsRequest>,
) -> ApiResult<AuthorRecord> {
    info!(query = %req.query, "Authors request");
    let harvest = state.pipeline.ingest_authors(&req.query).await;
    store_harvest(&state, &harvest)?;
    Ok(Json(harvest))
}
