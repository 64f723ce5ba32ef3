//! Console rendering of records and issues.

use crate::models::{ArticleRecord, AuthorRecord, Issue, CITED_BY_MISSING};
use std::io::{self, Write};

/// Abstracts longer than this are cut in the article listing
const ABSTRACT_PREVIEW: usize = 220;

/// Shown instead of the `-1` citation sentinel
const CITES_MISSING: &str = "No se encontró cites";

pub fn saved_notice(out: &mut impl Write, what: &str, count: usize) -> io::Result<()> {
    writeln!(out, "✔ Saved to database: {} {}(s).", count, what)
}

pub fn articles(out: &mut impl Write, articles: &[ArticleRecord]) -> io::Result<()> {
    writeln!(out, "\n=== Articles collected ===\n")?;
    for (i, a) in articles.iter().enumerate() {
        writeln!(out, "{:2}) [{}] {}", i + 1, a.author_query, a.title)?;
        writeln!(out, "    id      : {}", a.article_id)?;
        writeln!(out, "    authors : {}", a.authors_csv)?;
        writeln!(out, "    date    : {}", a.publication_year)?;
        if a.cited_by <= CITED_BY_MISSING {
            writeln!(out, "    cites   : {}", CITES_MISSING)?;
        } else {
            writeln!(out, "    cites   : {}", a.cited_by)?;
        }
        writeln!(out, "    link    : {}", a.link)?;
        writeln!(out, "    keywords: {}", a.keywords)?;
        writeln!(out, "    abstract: {}", preview(&a.abstract_text, ABSTRACT_PREVIEW))?;
        writeln!(out)?;
    }
    writeln!(out, "Total articles: {}", articles.len())
}

pub fn authors(out: &mut impl Write, authors: &[AuthorRecord]) -> io::Result<()> {
    writeln!(out, "\n=== Authors ===\n")?;
    for (i, a) in authors.iter().enumerate() {
        writeln!(
            out,
            "{:2}) {} | id: {} | citations: {} | h-index: {} | article: {}",
            i + 1,
            a.name,
            a.author_id.as_deref().unwrap_or("-"),
            count_or_dash(a.citations),
            count_or_dash(a.h_index),
            a.article_title
        )?;
        if let Some(url) = &a.profile_url {
            writeln!(out, "    profile: {}", url)?;
        }
    }
    writeln!(out, "Total authors: {}", authors.len())
}

pub fn issues(out: &mut impl Write, issues: &[Issue]) -> io::Result<()> {
    if issues.is_empty() {
        return writeln!(out, "✓ No issues logged.");
    }

    writeln!(out, "\n⚠ Issues logged ({}):", issues.len())?;
    for issue in issues {
        let status = issue
            .http_status
            .map(|s| format!(" [HTTP {}]", s))
            .unwrap_or_default();
        let subject = match (&issue.article_title, issue.http_status) {
            (Some(title), _) => title.as_str(),
            (None, Some(_)) => "(HTTP)",
            (None, None) => "(page)",
        };
        writeln!(
            out,
            " - [{}] {} :: {}{}",
            issue.author_query,
            subject,
            issue.description,
            status
        )?;
    }
    Ok(())
}

fn count_or_dash(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
