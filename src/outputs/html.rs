//! HTML rendering of article listings and detail pages.
//!
//! Pages are self-contained documents styled with Tailwind classes. Every
//! string taken from the API is escaped with [`escape_html`] except the
//! linkified summary, which the linkifier has already made safe and is
//! therefore inserted as-is.
//!
//! # File naming
//!
//! - Listing pages: `page-{n}.html`, `n` being the 1-based page number
//! - Detail pages: `article-{slug}.html`, see [`detail_filename`]
//!
//! Pager links only point at listing pages written in the same run; the
//! others render as disabled buttons.

use crate::api::ListQuery;
use crate::linkify::Linkifier;
use crate::models::{Article, ArticlePage, Pagination, SentimentFilter};
use crate::settings::Settings;
use crate::utils::{escape_html, format_long_date, format_short_date};
use std::error::Error;
use std::fmt::Write as _;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

const ENABLED_BUTTON: &str = "bg-blue-600 hover:bg-blue-700 text-white";
const DISABLED_BUTTON: &str = "bg-gray-300 text-gray-500 cursor-not-allowed";

pub fn listing_filename(page_number: usize) -> String {
    format!("page-{page_number}.html")
}

/// File name of an article's detail page.
///
/// ASCII letters, digits and `_` are kept; every other byte of the id is
/// written as `-` followed by two hex digits. The result never needs
/// percent-encoding, so it doubles as a relative `href`, and distinct ids
/// never share a file.
pub fn detail_filename(id: &str) -> String {
    let mut name = String::from("article-");
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' {
            name.push(char::from(byte));
        } else {
            let _ = write!(name, "-{byte:02x}");
        }
    }
    name.push_str(".html");
    name
}

fn document(title: &str, dark_mode: bool, body: &str) -> String {
    let html_class = if dark_mode { r#" class="dark""# } else { "" };
    format!(
        r#"<!DOCTYPE html>
<html lang="en"{html_class}>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<script src="https://cdn.tailwindcss.com"></script>
<script>tailwind.config = {{ darkMode: 'class' }}</script>
</head>
<body class="bg-gray-100 dark:bg-gray-900">
{body}
</body>
</html>
"#,
        title = escape_html(title),
    )
}

/// One grid card: image, sentiment badge, date, headline, linkified summary
/// and the two action links.
pub fn render_card(article: &Article, linkifier: &Linkifier) -> String {
    let mut card = String::from(
        r#"<div class="flex flex-col bg-white dark:bg-gray-800 shadow-lg rounded-xl overflow-hidden">"#,
    );

    if let Some(image) = article.image.as_deref().filter(|i| !i.is_empty()) {
        card.push_str(&format!(
            r#"<div class="h-48 w-full overflow-hidden"><img src="{}" alt="Article thumbnail" class="w-full h-full object-cover"></div>"#,
            escape_html(image)
        ));
    }

    card.push_str(r#"<div class="flex-1 p-4 flex flex-col"><div class="flex items-center justify-between mb-2">"#);
    card.push_str(&format!(
        r#"<span class="px-2 py-0.5 text-sm font-medium rounded {}">{}</span>"#,
        article.sentiment.badge_classes(),
        article.sentiment.label()
    ));
    if let Some(date) = article.timestamp.as_deref().and_then(format_short_date) {
        card.push_str(&format!(
            r#"<span class="text-xs text-gray-500 dark:text-gray-400">{date}</span>"#
        ));
    }
    card.push_str("</div>");

    card.push_str(&format!(
        r#"<h3 class="text-lg font-semibold text-gray-900 dark:text-gray-100 mb-2">{}</h3>"#,
        escape_html(&article.headline)
    ));
    card.push_str(&format!(
        r#"<p class="text-sm text-gray-700 dark:text-gray-300 flex-1 mb-4">{}</p>"#,
        article.linked_summary(linkifier)
    ));

    card.push_str(&format!(
        r#"<div class="mt-auto flex space-x-2"><a href="{}" class="flex-1 text-center px-3 py-2 bg-blue-600 hover:bg-blue-700 text-white rounded-md font-medium">View Details</a><a href="{}" target="_blank" rel="noopener noreferrer" class="flex-1 text-center px-3 py-2 bg-gray-100 dark:bg-gray-700 text-gray-800 dark:text-gray-200 rounded-md font-medium">Read Original</a></div>"#,
        detail_filename(&article.id),
        escape_html(&article.url)
    ));

    card.push_str("</div></div>");
    card
}

fn pager_button(
    label: &str,
    target: Option<usize>,
    page: &Pagination,
    rendered: &RangeInclusive<usize>,
) -> String {
    let page_number = target
        .map(|offset| (offset / page.page_size.max(1)).saturating_add(1))
        .filter(|n| rendered.contains(n));
    match page_number {
        Some(n) => format!(
            r#"<a href="{}" class="px-4 py-2 rounded-lg font-medium {ENABLED_BUTTON}">{label}</a>"#,
            listing_filename(n)
        ),
        None => format!(
            r#"<span aria-disabled="true" class="px-4 py-2 rounded-lg font-medium {DISABLED_BUTTON}">{label}</span>"#
        ),
    }
}

fn render_pagination(page: &Pagination, rendered: &RangeInclusive<usize>) -> String {
    format!(
        r#"<div class="flex items-center justify-center mt-8 space-x-4">{}<span class="text-gray-700 dark:text-gray-300">Page <span class="font-semibold">{}</span> of <span class="font-semibold">{}</span></span>{}</div>"#,
        pager_button("◀ Prev", page.prev_offset(), page, rendered),
        page.current_page(),
        page.total_pages(),
        pager_button("Next ▶", page.next_offset(), page, rendered),
    )
}

fn describe_query(query: &ListQuery) -> String {
    let mut parts = Vec::new();
    let keyword = query.keyword.trim();
    if !keyword.is_empty() {
        parts.push(format!("matching “{}”", escape_html(keyword)));
    }
    if let SentimentFilter::Only(sentiment) = query.sentiment {
        parts.push(format!("{} only", sentiment.label()));
    }
    parts.push(query.sort.label().to_string());
    parts.join(" · ")
}

/// Full listing page: controls summary, article grid and pagination footer.
///
/// `rendered` holds the 1-based numbers of the listing pages written
/// alongside this one.
pub fn render_home(
    page: &ArticlePage,
    query: &ListQuery,
    settings: &Settings,
    rendered: &RangeInclusive<usize>,
) -> String {
    let linkifier = settings.linkifier();
    let mut body = String::from(r#"<div class="max-w-6xl mx-auto px-4 py-6">"#);
    body.push_str(r#"<h2 class="text-3xl font-bold text-gray-900 dark:text-gray-100 mb-2">Latest News</h2>"#);
    body.push_str(&format!(
        r#"<p class="mb-6 text-gray-600 dark:text-gray-400">{}</p>"#,
        describe_query(query)
    ));

    if page.articles.is_empty() {
        body.push_str(r#"<p class="text-center text-gray-500 dark:text-gray-400">No articles found.</p>"#);
    } else {
        body.push_str(r#"<div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-3 gap-6">"#);
        for article in &page.articles {
            body.push_str(&render_card(article, &linkifier));
        }
        body.push_str("</div>");
    }

    body.push_str(&render_pagination(&page.pagination, rendered));
    body.push_str("</div>");
    document("Latest News", settings.dark_mode, &body)
}

/// Detail page for one article.
pub fn render_detail(article: &Article, settings: &Settings) -> String {
    let linkifier = settings.linkifier();
    let mut body = String::from(r#"<div class="max-w-3xl mx-auto px-4 py-8 space-y-6">"#);
    body.push_str(&format!(
        r#"<a href="{}" class="inline-flex items-center text-blue-600 hover:underline dark:text-blue-400">← Back to Home</a>"#,
        listing_filename(1)
    ));
    body.push_str(&format!(
        r#"<h1 class="text-4xl font-extrabold text-gray-900 dark:text-gray-100 leading-tight">{}</h1>"#,
        escape_html(&article.headline)
    ));

    body.push_str(r#"<div class="flex items-center space-x-4 text-gray-600 dark:text-gray-400">"#);
    if let Some(date) = article.timestamp.as_deref().and_then(format_long_date) {
        body.push_str(&format!(
            r#"<span>Published: <span class="font-medium">{date}</span></span>"#
        ));
    }
    body.push_str(&format!(
        r#"<span class="px-3 py-1 text-sm font-medium rounded-full {}">{}</span></div>"#,
        article.sentiment.detail_classes(),
        article.sentiment.label()
    ));

    if let Some(image) = article.image.as_deref().filter(|i| !i.is_empty()) {
        body.push_str(&format!(
            r#"<img src="{}" alt="{}" class="w-full rounded-lg shadow-md">"#,
            escape_html(image),
            escape_html(&article.headline)
        ));
    }

    body.push_str(&format!(
        r#"<p class="text-lg text-gray-800 dark:text-gray-200 leading-relaxed">{}</p>"#,
        article.linked_summary(&linkifier)
    ));
    body.push_str(&format!(
        r#"<a href="{}" target="_blank" rel="noopener noreferrer" class="inline-block px-4 py-2 bg-blue-600 hover:bg-blue-700 text-white rounded-lg font-medium">Read Original Article</a>"#,
        escape_html(&article.url)
    ));
    body.push_str("</div>");
    document(&article.headline, settings.dark_mode, &body)
}

/// Write a listing page to `{output_dir}/page-{n}.html`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), page = page.pagination.current_page()))]
pub async fn write_home(
    page: &ArticlePage,
    query: &ListQuery,
    settings: &Settings,
    rendered: &RangeInclusive<usize>,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = output_dir.join(listing_filename(page.pagination.current_page()));
    let html = render_home(page, query, settings, rendered);
    debug!(bytes = html.len(), "Rendered listing page");
    fs::write(&path, html).await?;
    info!(path = %path.display(), articles = page.articles.len(), "Wrote listing page");
    Ok(path)
}

/// Write a detail page to `{output_dir}/{detail_filename(id)}`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), id = %article.id))]
pub async fn write_detail(
    article: &Article,
    settings: &Settings,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = output_dir.join(detail_filename(&article.id));
    fs::write(&path, render_detail(article, settings)).await?;
    info!(path = %path.display(), "Wrote detail page");
    Ok(path)
}
