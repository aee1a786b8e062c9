//! JSON output of rendered listing pages.
//!
//! Each article is written with an extra `linked_summary` field holding the
//! linkified markup, so downstream consumers can inject it without running
//! the linkifier themselves.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── page-1.json
//! └── page-2.json
//! ```

use crate::linkify::Linkifier;
use crate::models::{Article, ArticlePage, Pagination};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Debug, Serialize)]
struct RenderedArticle<'a> {
    #[serde(flatten)]
    article: &'a Article,
    linked_summary: String,
}

#[derive(Debug, Serialize)]
struct RenderedPage<'a> {
    articles: Vec<RenderedArticle<'a>>,
    pagination: &'a Pagination,
}

/// Serialize a page with linkified summaries.
pub fn page_to_json(page: &ArticlePage, linkifier: &Linkifier) -> Result<String, Box<dyn Error>> {
    let rendered = RenderedPage {
        articles: page
            .articles
            .iter()
            .map(|article| RenderedArticle {
                article,
                linked_summary: article.linked_summary(linkifier),
            })
            .collect(),
        pagination: &page.pagination,
    };
    Ok(serde_json::to_string_pretty(&rendered)?)
}

/// Write a page to `{output_dir}/page-{n}.json`.
///
/// # Returns
///
/// The path written, or an error if directory creation or file writing fails.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_page(
    page: &ArticlePage,
    linkifier: &Linkifier,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = page_to_json(page, linkifier)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = output_dir.join(format!("page-{}.json", page.pagination.current_page()));
    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = page.articles.len(), "Wrote JSON page");

    Ok(path)
}
