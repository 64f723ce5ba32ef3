//! SQLite persistence for ingested records and issues.
//!
//! Articles and authors are deduplicated on their natural keys with
//! `INSERT OR IGNORE`, so re-ingesting the same results is harmless. Issues
//! are append-only.

use crate::error::Result;
use crate::models::{ArticleRecord, AuthorRecord, Issue};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tracing::{debug, info};

/// Read-back bound for articles
pub const ARTICLES_LIMIT: usize = 100;
/// Read-back bound for authors
pub const AUTHORS_LIMIT: usize = 500;
/// Read-back bound for issues
pub const ISSUES_LIMIT: usize = 100;

/// Bulk-insert / read-back contract for one record type
pub trait RecordStore<R> {
    /// Insert `records` in one transaction; returns how many rows were new
    fn save_all(&self, records: &[R]) -> Result<usize>;

    /// Most recent records, newest first, bounded
    fn find_all(&self) -> Result<Vec<R>>;
}

/// SQLite database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path` and ensure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self { conn };
        db.initialize_schema()?;
        info!(path = %path.display(), "Database ready");
        Ok(db)
    }

    /// In-memory database, schema included
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_query TEXT NOT NULL,
                article_id TEXT NOT NULL,
                title TEXT NOT NULL,
                authors TEXT NOT NULL,
                publication_date TEXT NOT NULL,
                abstract TEXT NOT NULL,
                link TEXT NOT NULL,
                keywords TEXT NOT NULL,
                cited_by INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,

                UNIQUE(author_query, article_id, title)
            );

            CREATE TABLE IF NOT EXISTS authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_name TEXT NOT NULL,
                author_id TEXT,
                citations INTEGER,
                h_index INTEGER,
                i10_index INTEGER,
                article_title TEXT NOT NULL,
                profile_url TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            -- IFNULL makes records without an author id deduplicate as well
            CREATE UNIQUE INDEX IF NOT EXISTS idx_authors_natural_key
            ON authors(author_name, IFNULL(author_id, ''), article_title);

            CREATE TABLE IF NOT EXISTS ingest_issues (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_query TEXT NOT NULL,
                article_title TEXT,
                issue TEXT NOT NULL,
                http_status INTEGER,
                raw_json TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;
        Ok(())
    }
}

fn to_sql_count(value: Option<u64>) -> Option<i64> {
    value.and_then(|v| i64::try_from(v).ok())
}

fn from_sql_count(value: Option<i64>) -> Option<u64> {
    value.and_then(|v| u64::try_from(v).ok())
}

impl RecordStore<ArticleRecord> for Database {
    fn save_all(&self, records: &[ArticleRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO articles \
                 (author_query, article_id, title, authors, publication_date, abstract, link, keywords, cited_by) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for a in records {
                inserted += stmt.execute(params![
                    a.author_query,
                    a.article_id,
                    a.title,
                    a.authors_csv,
                    a.publication_year,
                    a.abstract_text,
                    a.link,
                    a.keywords,
                    a.cited_by,
                ])?;
            }
        }
        tx.commit()?;

        debug!(total = records.len(), inserted, "Articles saved");
        Ok(inserted)
    }

    fn find_all(&self) -> Result<Vec<ArticleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT author_query, article_id, title, authors, publication_date, abstract, link, keywords, cited_by \
             FROM articles ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![ARTICLES_LIMIT as i64], article_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn article_from_row(row: &Row) -> rusqlite::Result<ArticleRecord> {
    Ok(ArticleRecord {
        author_query: row.get(0)?,
        article_id: row.get(1)?,
        title: row.get(2)?,
        authors_csv: row.get(3)?,
        publication_year: row.get(4)?,
        abstract_text: row.get(5)?,
        link: row.get(6)?,
        keywords: row.get(7)?,
        cited_by: row.get(8)?,
    })
}

impl RecordStore<AuthorRecord> for Database {
    fn save_all(&self, records: &[AuthorRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO authors \
                 (author_name, author_id, citations, h_index, i10_index, article_title, profile_url) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for a in records {
                inserted += stmt.execute(params![
                    a.name,
                    a.author_id,
                    to_sql_count(a.citations),
                    to_sql_count(a.h_index),
                    to_sql_count(a.i10_index),
                    a.article_title,
                    a.profile_url,
                ])?;
            }
        }
        tx.commit()?;

        debug!(total = records.len(), inserted, "Authors saved");
        Ok(inserted)
    }

    fn find_all(&self) -> Result<Vec<AuthorRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT author_name, author_id, citations, h_index, i10_index, article_title, profile_url \
             FROM authors ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![AUTHORS_LIMIT as i64], |row| {
            Ok(AuthorRecord {
                name: row.get(0)?,
                author_id: row.get(1)?,
                citations: from_sql_count(row.get(2)?),
                h_index: from_sql_count(row.get(3)?),
                i10_index: from_sql_count(row.get(4)?),
                article_title: row.get(5)?,
                profile_url: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl RecordStore<Issue> for Database {
    fn save_all(&self, records: &[Issue]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ingest_issues (author_query, article_title, issue, http_status, raw_json) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for i in records {
                inserted += stmt.execute(params![
                    i.author_query,
                    i.article_title,
                    i.description,
                    i.http_status,
                    i.raw_snippet,
                ])?;
            }
        }
        tx.commit()?;

        debug!(inserted, "Issues saved");
        Ok(inserted)
    }

    fn find_all(&self) -> Result<Vec<Issue>> {
        let mut stmt = self.conn.prepare(
            "SELECT author_query, article_title, issue, http_status, raw_json \
             FROM ingest_issues ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![ISSUES_LIMIT as i64], |row| {
            Ok(Issue {
                author_query: row.get(0)?,
                article_title: row.get(1)?,
                description: row.get(2)?,
                http_status: row.get(3)?,
                raw_snippet: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ID_MISSING, UNTITLED};
    use tempfile::TempDir;

    fn article(id: &str, title: &str) -> ArticleRecord {
        ArticleRecord {
            author_query: "Jane Doe".to_string(),
            article_id: id.to_string(),
            title: title.to_string(),
            authors_csv: "J Doe".to_string(),
            publication_year: "2020".to_string(),
            abstract_text: "abstract".to_string(),
            link: "https://example.org".to_string(),
            keywords: "ocean, carbon".to_string(),
            cited_by: -1,
        }
    }

    #[test]
    fn test_articles_idempotent_and_newest_first() -> Result<()> {
        let db = Database::open_in_memory()?;

        let batch = vec![article("a1", "First"), article("a2", "Second")];
        assert_eq!(db.save_all(batch.as_slice())?, 2);
        assert_eq!(db.save_all(batch.as_slice())?, 0);

        // Placeholder ids do not collide across different titles
        let placeholders = vec![article(ID_MISSING, UNTITLED), article(ID_MISSING, "Other")];
        assert_eq!(db.save_all(placeholders.as_slice())?, 2);

        let stored: Vec<ArticleRecord> = db.find_all()?;
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[0].title, "Other");
        assert_eq!(stored[3].title, "First");
        assert_eq!(stored[3].cited_by, -1);
        Ok(())
    }

    #[test]
    fn test_authors_dedup_with_null_ids() -> Result<()> {
        let db = Database::open_in_memory()?;

        let mut resolved = AuthorRecord::resolved("Jane Doe", "AB123", "Paper", "https://s/?user=");
        resolved.citations = Some(42);
        let batch = vec![resolved, AuthorRecord::unresolved("R Roe", "Paper")];

        assert_eq!(db.save_all(batch.as_slice())?, 2);
        assert_eq!(db.save_all(batch.as_slice())?, 0);

        let stored: Vec<AuthorRecord> = db.find_all()?;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].name, "R Roe");
        assert_eq!(stored[1].citations, Some(42));
        assert_eq!(stored[1].profile_url.as_deref(), Some("https://s/?user=AB123"));
        Ok(())
    }

    #[test]
    fn test_issues_append_only() -> Result<()> {
        let db = Database::open_in_memory()?;
        let issues = vec![Issue::http("Jane Doe", 500)];

        db.save_all(issues.as_slice())?;
        db.save_all(issues.as_slice())?;

        let stored: Vec<Issue> = db.find_all()?;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].http_status, Some(500));
        Ok(())
    }

    #[test]
    fn test_open_on_disk() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("scholar.db");
        {
            let db = Database::open(&path)?;
            db.save_all([article("a1", "First")].as_slice())?;
        }
        let db = Database::open(&path)?;
        let stored: Vec<ArticleRecord> = db.find_all()?;
        assert_eq!(stored.len(), 1);
        Ok(())
    }
}
