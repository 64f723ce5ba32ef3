//! Payload extraction from SerpApi `organic_results` items.
//!
//! Items are loosely shaped, so each value that can live in several places is
//! read through an ordered list of strategies; the first one that yields
//! something wins. Missing article fields are replaced by placeholders and
//! reported as issues instead of failing the item.

use crate::keywords::keywords;
use crate::models::{
    ArticleRecord, AuthorRef, Issue, MissingField, ABSTRACT_MISSING, CITED_BY_MISSING,
    DATE_MISSING, ID_MISSING, KEYWORDS_MISSING, LINK_MISSING, UNTITLED,
};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(19|20)\d{2}").expect("year pattern is valid"));

/// Summary-derived names outside this length range are discarded
const NAME_LEN_RANGE: std::ops::RangeInclusive<usize> = 2..=120;

// ============================================================================
// JSON helpers
// ============================================================================

/// Follow a path of object keys
pub fn at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.as_object()?.get(*key))
}

/// Scalar field rendered as text; objects, arrays and null count as absent
pub fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Lenient non-negative count: integers or numeric strings ("1,234" included).
///
/// Anything else is treated as absent rather than as an error.
pub fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

// ============================================================================
// Author strategies
// ============================================================================

/// One way of finding author mentions inside a result item
pub trait AuthorStrategy: Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, item: &Value) -> Vec<AuthorRef>;
}

/// Top-level `authors[]`
pub struct TopLevelAuthors;

/// `publication_info.authors[]`
pub struct PublicationInfoAuthors;

/// Names parsed from the free-text `publication_info.summary`
pub struct SummaryNames;

impl AuthorStrategy for TopLevelAuthors {
    fn name(&self) -> &'static str {
        "authors"
    }

    fn extract(&self, item: &Value) -> Vec<AuthorRef> {
        author_objects(item.get("authors"))
    }
}

impl AuthorStrategy for PublicationInfoAuthors {
    fn name(&self) -> &'static str {
        "publication_info.authors"
    }

    fn extract(&self, item: &Value) -> Vec<AuthorRef> {
        author_objects(at(item, &["publication_info", "authors"]))
    }
}

impl AuthorStrategy for SummaryNames {
    fn name(&self) -> &'static str {
        "publication_info.summary"
    }

    fn extract(&self, item: &Value) -> Vec<AuthorRef> {
        at(item, &["publication_info", "summary"])
            .and_then(Value::as_str)
            .map(names_from_summary)
            .unwrap_or_default()
            .into_iter()
            .map(AuthorRef::bare)
            .collect()
    }
}

/// Author discovery: structured fields first, then the summary heuristic
pub const DISCOVERY_STRATEGIES: &[&dyn AuthorStrategy] =
    &[&TopLevelAuthors, &PublicationInfoAuthors, &SummaryNames];

/// Structured fields only; used to build `authors_csv`
pub const STRUCTURED_STRATEGIES: &[&dyn AuthorStrategy] =
    &[&TopLevelAuthors, &PublicationInfoAuthors];

/// First non-empty result of `strategies`
pub fn first_authors(strategies: &[&dyn AuthorStrategy], item: &Value) -> Vec<AuthorRef> {
    for strategy in strategies {
        let found = strategy.extract(item);
        if !found.is_empty() {
            tracing::trace!(strategy = strategy.name(), count = found.len(), "Authors found");
            return found;
        }
    }
    Vec::new()
}

/// Author mentions of one item; empty (never an error) when none can be found
pub fn extract_authors(item: &Value) -> Vec<AuthorRef> {
    first_authors(DISCOVERY_STRATEGIES, item)
}

fn author_objects(list: Option<&Value>) -> Vec<AuthorRef> {
    list.and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let name = text_field(entry, "name")?;
                    if name.trim().is_empty() {
                        return None;
                    }
                    Some(AuthorRef {
                        name,
                        author_id: text_field(entry, "author_id")
                            .or_else(|| text_field(entry, "id"))
                            .filter(|id| !id.trim().is_empty()),
                        profile_link: text_field(entry, "link"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Split "by A Author, B Author and C Author - Venue, 2020" into names
pub fn names_from_summary(summary: &str) -> Vec<String> {
    let mut text = summary.trim_start();
    if text
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("by "))
    {
        text = &text[3..];
    }
    if let Some(cut) = text.find(" - ") {
        text = &text[..cut];
    }

    text.replace(" and ", ",")
        .split(',')
        .map(str::trim)
        .filter(|name| NAME_LEN_RANGE.contains(&name.chars().count()))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Count strategies
// ============================================================================

/// One place a non-negative count may live in a payload
pub trait CountStrategy: Sync {
    fn name(&self) -> &'static str;
    fn count(&self, value: &Value) -> Option<u64>;
}

/// `cited_by.value` of a search result
pub struct CitedByValue;

/// `inline_links.cited_by.total` of a search result
pub struct InlineCitedByTotal;

/// `cited_by.<metric>.all` of an author-detail response
pub struct DirectMetric(pub &'static str);

/// First `cited_by.table[].<metric>.all` of an author-detail response
pub struct TableMetric(pub &'static str);

impl CountStrategy for CitedByValue {
    fn name(&self) -> &'static str {
        "cited_by.value"
    }

    fn count(&self, value: &Value) -> Option<u64> {
        at(value, &["cited_by", "value"]).and_then(as_count)
    }
}

impl CountStrategy for InlineCitedByTotal {
    fn name(&self) -> &'static str {
        "inline_links.cited_by.total"
    }

    fn count(&self, value: &Value) -> Option<u64> {
        at(value, &["inline_links", "cited_by", "total"]).and_then(as_count)
    }
}

impl CountStrategy for DirectMetric {
    fn name(&self) -> &'static str {
        "cited_by.<metric>.all"
    }

    fn count(&self, value: &Value) -> Option<u64> {
        at(value, &["cited_by", self.0, "all"]).and_then(as_count)
    }
}

impl CountStrategy for TableMetric {
    fn name(&self) -> &'static str {
        "cited_by.table[].<metric>.all"
    }

    fn count(&self, value: &Value) -> Option<u64> {
        at(value, &["cited_by", "table"])?
            .as_array()?
            .iter()
            .find_map(|row| at(row, &[self.0, "all"]).and_then(as_count))
    }
}

/// Citation count locations of a search result, in priority order
pub const CITED_BY_STRATEGIES: &[&dyn CountStrategy] = &[&CitedByValue, &InlineCitedByTotal];

/// First count found by `strategies`
pub fn first_count(strategies: &[&dyn CountStrategy], value: &Value) -> Option<u64> {
    strategies.iter().find_map(|s| {
        let found = s.count(value);
        if found.is_some() {
            tracing::trace!(strategy = s.name(), "Count found");
        }
        found
    })
}

// ============================================================================
// Article normalization
// ============================================================================

/// Outcome of normalizing one result item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Record built, with one issue per missing optional field
    Article(ArticleRecord, Vec<Issue>),
    /// No author could be extracted; the item is not stored
    Skipped(Issue),
}

/// First `(19|20)\d{2}` inside `publication_info.summary`
pub fn extract_year(item: &Value) -> Option<String> {
    let summary = at(item, &["publication_info", "summary"])?.as_str()?;
    YEAR_RE.find(summary).map(|m| m.as_str().to_string())
}

/// Citation count of a search result, `None` when absent or unparsable
pub fn extract_cited_by(item: &Value) -> Option<i64> {
    first_count(CITED_BY_STRATEGIES, item).and_then(|n| i64::try_from(n).ok())
}

/// Build an `ArticleRecord` from one result item.
pub fn normalize_article(item: &Value, author_query: &str) -> Normalized {
    let title = text_field(item, "title").unwrap_or_else(|| UNTITLED.to_string());

    let authors = first_authors(STRUCTURED_STRATEGIES, item);
    if authors.is_empty() {
        return Normalized::Skipped(Issue::no_authors(author_query, &title, &item.to_string()));
    }
    let authors_csv = authors
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let article_id = text_field(item, "result_id");
    let year = extract_year(item);
    let abstract_text = text_field(item, "snippet");
    let cited_by = extract_cited_by(item);
    let keywords = keywords(abstract_text.as_deref().unwrap_or(&title), &authors_csv);

    let mut issues = Vec::new();
    let mut note = |present: bool, field: MissingField| {
        if !present {
            issues.push(Issue::missing(author_query, &title, field));
        }
    };
    note(article_id.is_some(), MissingField::ArticleId);
    note(year.is_some(), MissingField::PublicationDate);
    note(abstract_text.is_some(), MissingField::Abstract);
    note(keywords.is_some(), MissingField::Keywords);
    note(cited_by.is_some(), MissingField::Citations);

    let record = ArticleRecord {
        author_query: author_query.to_string(),
        article_id: article_id.unwrap_or_else(|| ID_MISSING.to_string()),
        link: text_field(item, "link").unwrap_or_else(|| LINK_MISSING.to_string()),
        authors_csv,
        publication_year: year.unwrap_or_else(|| DATE_MISSING.to_string()),
        abstract_text: abstract_text.unwrap_or_else(|| ABSTRACT_MISSING.to_string()),
        keywords: keywords.unwrap_or_else(|| KEYWORDS_MISSING.to_string()),
        cited_by: cited_by.unwrap_or(CITED_BY_MISSING),
        title,
    };

    Normalized::Article(record, issues)
}
