//! Records produced by the pipeline and the issues raised along the way.

use serde::{Deserialize, Serialize};

/// Placeholder for a missing `result_id`
pub const ID_MISSING: &str = "No se encontró id";
/// Placeholder for a missing publication year
pub const DATE_MISSING: &str = "No se encontró fecha";
/// Placeholder for a missing snippet
pub const ABSTRACT_MISSING: &str = "No se encontró abstracto";
/// Placeholder when the keyword heuristic yields nothing
pub const KEYWORDS_MISSING: &str = "No se encontraron keywords";
/// Placeholder for a missing article link
pub const LINK_MISSING: &str = "N/D";
/// Title used when an item has none
pub const UNTITLED: &str = "(sin título)";
/// Sentinel for unknown citation counts, distinct from a real zero
pub const CITED_BY_MISSING: i64 = -1;

/// Raw JSON kept on an issue is cut to this many characters
pub const RAW_SNIPPET_LIMIT: usize = 800;

/// Unenriched author mention found inside one search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRef {
    pub name: String,
    pub author_id: Option<String>,
    pub profile_link: Option<String>,
}

impl AuthorRef {
    /// Name-only reference, as produced by the summary heuristic
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author_id: None,
            profile_link: None,
        }
    }
}

/// Author as persisted, after enrichment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub name: String,
    pub author_id: Option<String>,
    pub citations: Option<u64>,
    pub h_index: Option<u64>,
    pub i10_index: Option<u64>,
    /// Article the author was discovered on
    pub article_title: String,
    /// Always `profile_base + author_id` when `author_id` is set
    pub profile_url: Option<String>,
}

impl AuthorRecord {
    /// Record for an author whose id could not be resolved
    pub fn unresolved(name: impl Into<String>, article_title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author_id: None,
            citations: None,
            h_index: None,
            i10_index: None,
            article_title: article_title.into(),
            profile_url: None,
        }
    }

    /// Record for a resolved author id; the profile URL is derived from it
    pub fn resolved(
        name: impl Into<String>,
        author_id: impl Into<String>,
        article_title: impl Into<String>,
        profile_base: &str,
    ) -> Self {
        let author_id = author_id.into();
        Self {
            profile_url: Some(format!("{}{}", profile_base, author_id)),
            author_id: Some(author_id),
            ..Self::unresolved(name, article_title)
        }
    }
}

/// Normalized article; optional text fields hold placeholders instead of nulls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub author_query: String,
    pub article_id: String,
    pub title: String,
    /// Comma-joined author names, never empty
    pub authors_csv: String,
    pub publication_year: String,
    pub abstract_text: String,
    pub link: String,
    pub keywords: String,
    /// `CITED_BY_MISSING` when unknown
    pub cited_by: i64,
}

/// Optional article field whose absence is reported as an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    ArticleId,
    PublicationDate,
    Abstract,
    Keywords,
    Citations,
}

impl MissingField {
    pub fn description(self) -> &'static str {
        match self {
            Self::ArticleId => "Missing article_id",
            Self::PublicationDate => "Missing publication_date",
            Self::Abstract => "Missing abstract",
            Self::Keywords => "Missing keywords (computed)",
            Self::Citations => "Missing citations",
        }
    }
}

/// Data-quality or transport problem, kept alongside the partial data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub author_query: String,
    /// `None` for page-level failures
    pub article_title: Option<String>,
    pub description: String,
    pub http_status: Option<i32>,
    pub raw_snippet: Option<String>,
}

impl Issue {
    pub fn missing(author_query: &str, article_title: &str, field: MissingField) -> Self {
        Self {
            author_query: author_query.to_string(),
            article_title: Some(article_title.to_string()),
            description: field.description().to_string(),
            http_status: None,
            raw_snippet: None,
        }
    }

    /// Item dropped because no author could be extracted
    pub fn no_authors(author_query: &str, article_title: &str, raw: &str) -> Self {
        Self {
            author_query: author_query.to_string(),
            article_title: Some(article_title.to_string()),
            description: "Article without authors".to_string(),
            http_status: None,
            raw_snippet: Some(truncate_raw(raw)),
        }
    }

    /// Page request that failed after all retries
    pub fn http(author_query: &str, status: i32) -> Self {
        Self {
            author_query: author_query.to_string(),
            article_title: None,
            description: format!("HTTP error {}", status),
            http_status: Some(status),
            raw_snippet: None,
        }
    }

    /// Free-form page-level problem
    pub fn page(author_query: &str, description: impl Into<String>, raw: Option<&str>) -> Self {
        Self {
            author_query: author_query.to_string(),
            article_title: None,
            description: description.into(),
            http_status: None,
            raw_snippet: raw.map(truncate_raw),
        }
    }
}

/// Cut raw JSON to `RAW_SNIPPET_LIMIT` characters, marking the cut with `…`
pub fn truncate_raw(raw: &str) -> String {
    match raw.char_indices().nth(RAW_SNIPPET_LIMIT) {
        Some((idx, _)) => format!("{}…", &raw[..idx]),
        None => raw.to_string(),
    }
}

/// Records of one operation together with the issues it raised
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Harvest<T> {
    pub records: Vec<T>,
    pub issues: Vec<Issue>,
}

impl<T> Harvest<T> {
    pub fn new(records: Vec<T>, issues: Vec<Issue>) -> Self {
        Self { records, issues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_raw() {
        let short = "{\"title\":\"x\"}";
        assert_eq!(truncate_raw(short), short);

        let long = "é".repeat(900);
        let cut = truncate_raw(&long);
        assert_eq!(cut.chars().count(), RAW_SNIPPET_LIMIT + 1);
        assert!(cut.ends_with('…'));

        let exact = "a".repeat(RAW_SNIPPET_LIMIT);
        assert_eq!(truncate_raw(&exact), exact);
    }

    #[test]
    fn test_resolved_author_derives_profile() {
        let record = AuthorRecord::resolved(
            "Jane Doe",
            "AB123",
            "Some Paper",
            "https://scholar.google.com/citations?user=",
        );
        assert_eq!(
            record.profile_url.as_deref(),
            Some("https://scholar.google.com/citations?user=AB123")
        );
        assert_eq!(record.author_id.as_deref(), Some("AB123"));

        let bare = AuthorRecord::unresolved("Jane Doe", "Some Paper");
        assert!(bare.author_id.is_none());
        assert!(bare.profile_url.is_none());
    }

    #[test]
    fn test_http_issue() {
        let issue = Issue::http("Jane Doe", 500);
        assert_eq!(issue.http_status, Some(500));
        assert_eq!(issue.description, "HTTP error 500");
        assert!(issue.article_title.is_none());
    }
}
