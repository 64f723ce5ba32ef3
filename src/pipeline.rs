//! Paginated ingestion with per-operation issue tracking.
//!
//! Each operation pages through the search engine sequentially, hands every
//! item to the extractor and collects both records and issues. A page that
//! cannot be fetched ends the operation with one issue; retries already
//! happened inside the transport.

use crate::config::Config;
use crate::enrich::AuthorEnricher;
use crate::error::{IngestError, Result};
use crate::extract::{extract_authors, normalize_article, text_field, Normalized};
use crate::models::{ArticleRecord, AuthorRecord, AuthorRef, Harvest, Issue, UNTITLED};
use crate::transport::{HttpTransport, Transport};
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Append-only issue accumulator owned by a single operation
#[derive(Debug, Default)]
pub struct IssueLog {
    issues: Vec<Issue>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    /// Record a page-level failure for `query`
    pub fn page_failure(&mut self, query: &str, err: &IngestError) {
        let issue = match err {
            IngestError::Http { status, .. } => Issue::http(query, *status),
            other => Issue::page(query, format!("Unreadable search response: {}", other), None),
        };
        self.push(issue);
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Return the accumulated issues and clear the log
    pub fn drain(&mut self) -> Vec<Issue> {
        std::mem::take(&mut self.issues)
    }
}

/// Article whose authors were discovered, before enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredArticle {
    pub title: String,
    pub authors: Vec<AuthorRef>,
}

/// Search-and-enrich pipeline over a `Transport`
pub struct ScholarPipeline<T: Transport> {
    config: Config,
    transport: T,
}

impl ScholarPipeline<HttpTransport> {
    /// Pipeline over the real HTTP transport
    pub fn from_config(config: Config) -> Self {
        let transport = HttpTransport::from_config(&config);
        Self::new(config, transport)
    }
}

impl<T: Transport> ScholarPipeline<T> {
    pub fn new(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn enricher(&self) -> AuthorEnricher<'_, T> {
        AuthorEnricher::new(&self.transport, &self.config)
    }

    /// One page of results; a missing `organic_results` array is an empty page.
    ///
    /// An `error` message sent alongside an empty page is reported on `log`
    /// and does not stop pagination.
    async fn fetch_page(
        &self,
        query: &str,
        start: usize,
        issue_query: &str,
        log: &mut IssueLog,
    ) -> Result<Vec<Value>> {
        let body = self
            .transport
            .get(&self.config.search_url(query, start))
            .await?;
        let mut root: Value = serde_json::from_str(&body)?;

        let items = match root.get_mut("organic_results").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        if items.is_empty() {
            if let Some(message) = root.get("error").and_then(Value::as_str) {
                warn!(query, start, message, "Search API reported an empty page");
                log.push(Issue::page(issue_query, format!("Search API error: {}", message), None));
            }
        }

        Ok(items)
    }

    /// Up to `limit` articles for an author name, skipping items without authors.
    pub async fn fetch_top(&self, author_query: &str, limit: usize) -> Harvest<ArticleRecord> {
        let quoted = format!("\"{}\"", author_query);
        let mut log = IssueLog::new();
        let mut records: Vec<ArticleRecord> = Vec::new();
        let mut start = 0;
        let mut pages = 0;

        info!(query = author_query, limit, "Fetching top articles");

        while records.len() < limit && pages < self.config.max_pages {
            let items = match self.fetch_page(&quoted, start, author_query, &mut log).await {
                Ok(items) => items,
                Err(e) => {
                    error!(query = author_query, start, error = %e, "Page fetch failed, aborting");
                    log.page_failure(author_query, &e);
                    break;
                }
            };
            debug!(query = author_query, start, items = items.len(), "Page fetched");

            for item in &items {
                if records.len() >= limit {
                    break;
                }
                match normalize_article(item, author_query) {
                    Normalized::Article(record, issues) => {
                        log.extend(issues);
                        records.push(record);
                    }
                    Normalized::Skipped(issue) => {
                        debug!(title = ?issue.article_title, "Skipping item without authors");
                        log.push(issue);
                    }
                }
            }

            start += self.config.page_size;
            pages += 1;
        }

        info!(
            query = author_query,
            records = records.len(),
            issues = log.len(),
            pages,
            "Top articles fetched"
        );
        Harvest::new(records, log.drain())
    }

    /// First result item whose authors can be discovered
    pub async fn discover_authors(&self, query: &str, log: &mut IssueLog) -> Option<DiscoveredArticle> {
        let mut start = 0;

        for _ in 0..self.config.max_pages {
            let items = match self.fetch_page(query, start, query, log).await {
                Ok(items) => items,
                Err(e) => {
                    error!(query, start, error = %e, "Page fetch failed, aborting");
                    log.page_failure(query, &e);
                    return None;
                }
            };
            if items.is_empty() {
                break;
            }

            for item in &items {
                let title = text_field(item, "title").unwrap_or_else(|| UNTITLED.to_string());
                let authors = extract_authors(item);
                if authors.is_empty() {
                    log.push(Issue::no_authors(query, &title, &item.to_string()));
                    continue;
                }
                info!(query, title = %title, authors = authors.len(), "Article with authors found");
                return Some(DiscoveredArticle { title, authors });
            }

            start += self.config.page_size;
        }

        None
    }

    /// Enriched authors of the first result with discoverable authors.
    pub async fn ingest_authors(&self, query: &str) -> Harvest<AuthorRecord> {
        let mut log = IssueLog::new();

        let Some(article) = self.discover_authors(query, &mut log).await else {
            warn!(query, "No article with authors found");
            log.push(Issue::page(query, "No article with authors found", None));
            return Harvest::new(Vec::new(), log.drain());
        };

        let enricher = self.enricher();
        let mut records = Vec::with_capacity(article.authors.len());
        for author in &article.authors {
            records.push(enricher.enrich(author, &article.title).await);
        }

        Harvest::new(records, log.drain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::scripted::ScriptedTransport;
    use crate::transport::RetryPolicy;
    use serde_json::json;
    use std::time::Duration;

    fn authored(n: usize) -> Value {
        json!({
            "title": format!("Authored paper {n}"),
            "result_id": format!("id{n}"),
            "snippet": "Ocean carbon uptake modelling",
            "publication_info": {
                "summary": "J Doe - Journal, 2021",
                "authors": [{"name": "J Doe", "author_id": "JD1"}]
            },
            "inline_links": {"cited_by": {"total": n}}
        })
    }

    fn anonymous(n: usize) -> Value {
        json!({"title": format!("Anonymous paper {n}"), "snippet": "no authors here"})
    }

    fn page(items: Vec<Value>) -> Result<String> {
        Ok(json!({ "organic_results": items }).to_string())
    }

    fn config() -> Config {
        Config::new("test-key").expect("valid key")
    }

    #[test]
    fn test_issue_log_drain_clears() {
        let mut log = IssueLog::new();
        log.push(Issue::http("q", 500));
        log.push(Issue::page("q", "odd", None));
        assert_eq!(log.len(), 2);

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.is_empty());
        assert!(log.drain().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_top_stops_at_limit() {
        let mut first = vec![authored(1)];
        first.extend((0..9).map(anonymous));
        let mut second: Vec<Value> = (2..5).map(authored).collect();
        second.extend((9..16).map(anonymous));

        let transport = ScriptedTransport::new(vec![page(first), page(second), page(vec![authored(99)])]);
        let pipeline = ScholarPipeline::new(config(), transport);

        let harvest = pipeline.fetch_top("Jane Doe", 3).await;

        let titles: Vec<&str> = harvest.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Authored paper 1", "Authored paper 2", "Authored paper 3"]);

        let requests = pipeline.transport.requests();
        assert_eq!(requests.len(), 2, "third page must not be requested");
        assert!(requests[0].contains("start=0"));
        assert!(requests[1].contains("start=10"));
        assert!(requests[0].contains("q=%22Jane%20Doe%22"));

        let skipped = harvest
            .issues
            .iter()
            .filter(|i| i.description == "Article without authors")
            .count();
        assert_eq!(skipped, 9);
    }

    #[tokio::test]
    async fn test_fetch_top_respects_page_ceiling() {
        let pages = (0..5).map(|p| page((0..10).map(|i| anonymous(p * 10 + i)).collect())).collect();
        let pipeline = ScholarPipeline::new(config(), ScriptedTransport::new(pages));

        let harvest = pipeline.fetch_top("Nobody", 5).await;

        assert!(harvest.records.is_empty());
        assert_eq!(pipeline.transport.requests().len(), 3);
        assert_eq!(harvest.issues.len(), 30);
    }

    #[tokio::test]
    async fn test_http_failure_aborts_with_one_issue() {
        let transport = ScriptedTransport::new(vec![
            Err(IngestError::Http {
                status: 500,
                message: "boom".to_string(),
            }),
            page(vec![authored(1)]),
        ]);
        let pipeline = ScholarPipeline::new(config(), transport);

        let harvest = pipeline.fetch_top("Jane Doe", 3).await;

        assert!(harvest.records.is_empty());
        assert_eq!(harvest.issues.len(), 1);
        assert_eq!(harvest.issues[0].http_status, Some(500));
        assert_eq!(harvest.issues[0].author_query, "Jane Doe");
        assert!(harvest.issues[0].article_title.is_none());
        assert_eq!(pipeline.transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_page_aborts() {
        let transport = ScriptedTransport::new(vec![Ok("<html>captcha</html>".to_string())]);
        let pipeline = ScholarPipeline::new(config(), transport);

        let harvest = pipeline.fetch_top("Jane Doe", 3).await;

        assert!(harvest.records.is_empty());
        assert_eq!(harvest.issues.len(), 1);
        assert_eq!(harvest.issues[0].http_status, None);
    }

    #[tokio::test]
    async fn test_missing_organic_results_is_empty_page() {
        let transport = ScriptedTransport::new(vec![
            Ok(json!({"search_metadata": {}}).to_string()),
            page(vec![authored(1)]),
        ]);
        let pipeline = ScholarPipeline::new(config(), transport);

        let harvest = pipeline.fetch_top("Jane Doe", 1).await;

        assert_eq!(harvest.records.len(), 1);
        assert!(harvest.issues.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_page_keeps_paginating() {
        let transport = ScriptedTransport::new(vec![
            Ok(json!({
                "search_metadata": {"status": "Success"},
                "error": "Google hasn't returned any results for this query."
            })
            .to_string()),
            page(vec![authored(1)]),
            page(vec![]),
        ]);
        let pipeline = ScholarPipeline::new(config(), transport);

        let harvest = pipeline.fetch_top("Jane Doe", 3).await;

        assert_eq!(harvest.records.len(), 1);
        assert_eq!(harvest.records[0].title, "Authored paper 1");
        assert_eq!(harvest.issues.len(), 1);
        assert!(harvest.issues[0].description.contains("Google hasn't returned any results"));
        assert_eq!(harvest.issues[0].http_status, None);

        let requests = pipeline.transport.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].contains("start=10"));
    }

    #[tokio::test]
    async fn test_ingest_authors_enriches_first_authored_item() {
        let transport = ScriptedTransport::new(vec![
            page(vec![
                anonymous(0),
                json!({
                    "title": "Attention",
                    "publication_info": {"summary": "by A Vaswani and N Shazeer - NeurIPS, 2017"}
                }),
            ]),
        ]);
        let pipeline = ScholarPipeline::new(config(), transport);

        let harvest = pipeline.ingest_authors("attention").await;

        let names: Vec<&str> = harvest.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A Vaswani", "N Shazeer"]);
        assert!(harvest.records.iter().all(|r| r.article_title == "Attention"));
        assert_eq!(harvest.issues.len(), 1);
        // no ids in the summary, so only the search page was requested
        assert_eq!(pipeline.transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_authors_looks_up_ids() {
        let transport = ScriptedTransport::new(vec![
            page(vec![authored(1)]),
            Ok(json!({"author": {"name": "Jane Doe"}, "cited_by": {"citations": {"all": 10}}}).to_string()),
        ]);
        let pipeline = ScholarPipeline::new(config(), transport);

        let harvest = pipeline.ingest_authors("ocean carbon").await;

        assert_eq!(harvest.records.len(), 1);
        assert_eq!(harvest.records[0].name, "Jane Doe");
        assert_eq!(harvest.records[0].citations, Some(10));
        assert!(harvest.issues.is_empty());
        let requests = pipeline.transport.requests();
        assert!(requests[1].contains("author_id=JD1"));
    }

    #[tokio::test]
    async fn test_ingest_authors_nothing_found() {
        let pipeline = ScholarPipeline::new(config(), ScriptedTransport::new(vec![page(vec![])]));

        let harvest = pipeline.ingest_authors("void").await;

        assert!(harvest.records.is_empty());
        assert_eq!(harvest.issues.len(), 1);
        assert_eq!(harvest.issues[0].description, "No article with authors found");
    }

    #[tokio::test]
    async fn test_http_transport_500_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search.json")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("upstream down")
            .expect(3)
            .create_async()
            .await;

        let mut config = config().with_search_base(format!("{}/search.json", server.url()));
        config.retry = RetryPolicy::new(3, Duration::from_millis(5));
        let pipeline = ScholarPipeline::from_config(config);

        let harvest = pipeline.fetch_top("Jane Doe", 3).await;

        assert!(harvest.records.is_empty());
        assert_eq!(harvest.issues.len(), 1);
        assert_eq!(harvest.issues[0].http_status, Some(500));
        mock.assert_async().await;
    }
}
