//! Author enrichment through the SerpApi author-detail engine.
//!
//! Enrichment never fails: whatever cannot be resolved is left absent on the
//! returned record and logged.

use crate::config::Config;
use crate::error::Result;
use crate::extract::{at, first_count, CountStrategy, DirectMetric, TableMetric};
use crate::models::{AuthorRecord, AuthorRef};
use crate::transport::Transport;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

/// Base used to resolve relative profile links such as `/citations?user=..`
const SCHOLAR_ORIGIN: &str = "https://scholar.google.com";

/// Resolves `AuthorRef`s into `AuthorRecord`s
pub struct AuthorEnricher<'a, T: Transport + ?Sized> {
    transport: &'a T,
    config: &'a Config,
}

impl<'a, T: Transport + ?Sized> AuthorEnricher<'a, T> {
    pub fn new(transport: &'a T, config: &'a Config) -> Self {
        Self { transport, config }
    }

    /// Enrich one author discovered on `article_title`.
    pub async fn enrich(&self, author: &AuthorRef, article_title: &str) -> AuthorRecord {
        let author_id = author
            .author_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| author.profile_link.as_deref().and_then(user_param));

        let Some(author_id) = author_id else {
            debug!(author = %author.name, "No author id, keeping bare record");
            return AuthorRecord::unresolved(author.name.clone(), article_title);
        };

        let mut record = AuthorRecord::resolved(
            author.name.clone(),
            author_id.clone(),
            article_title,
            &self.config.profile_base,
        );

        match self.fetch_detail(&author_id).await {
            Ok(detail) => {
                apply_detail(&mut record, &detail);
                info!(
                    author = %record.name,
                    author_id = %author_id,
                    citations = ?record.citations,
                    "Author enriched"
                );
            }
            Err(e) => {
                warn!(author_id = %author_id, error = %e, "Author detail lookup failed");
            }
        }

        record
    }

    async fn fetch_detail(&self, author_id: &str) -> Result<Value> {
        let body = self.transport.get(&self.config.author_url(author_id)).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// `user` query parameter of a Scholar profile link
pub fn user_param(link: &str) -> Option<String> {
    let url = Url::parse(link)
        .or_else(|_| Url::parse(SCHOLAR_ORIGIN).and_then(|base| base.join(link)))
        .ok()?;

    url.query_pairs()
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Copy name and metrics from an author-detail response onto `record`
pub fn apply_detail(record: &mut AuthorRecord, detail: &Value) {
    if let Some(name) = at(detail, &["author", "name"])
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
    {
        record.name = name.to_string();
    }

    record.citations = metric(detail, "citations");
    record.h_index = metric(detail, "h_index");
    record.i10_index = metric(detail, "i10_index");
}

fn metric(detail: &Value, name: &'static str) -> Option<u64> {
    let strategies: [&dyn CountStrategy; 2] = [&DirectMetric(name), &TableMetric(name)];
    first_count(&strategies, detail)
}
