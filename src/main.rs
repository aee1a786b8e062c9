//! # Sentiment News Reader
//!
//! Command-line entry point. Each subcommand loads the persisted settings,
//! talks to the sentiment API where needed, and writes rendered pages.
//!
//! ## Usage
//!
//! ```sh
//! sentiment_news_reader list --out ./site --pages 3 --details
//! sentiment_news_reader search "New York" --out ./site
//! ```
//!
//! Logging is controlled with `RUST_LOG` (default `info`) and goes to stderr
//! so that `linkify` output on stdout stays clean.

use clap::Parser;
use sentiment_news_reader::api::{ListQuery, NewsClient};
use sentiment_news_reader::cli::{
    Cli, Command, LinkifyArgs, ListArgs, SearchArgs, SettingsCommand, ShowArgs,
};
use sentiment_news_reader::linkify::{Linkifier, normalize_keywords};
use sentiment_news_reader::models::ArticlePage;
use sentiment_news_reader::outputs::{html, json};
use sentiment_news_reader::settings::Settings;
use sentiment_news_reader::utils::{ensure_writable_dir, truncate_for_log};
use std::error::Error;
use std::ops::RangeInclusive;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(config = %args.config.display(), ?args.api_url, "Parsed CLI arguments");

    let settings = Settings::load(&args.config).await.map_err(|e| {
        error!(path = %args.config.display(), error = %e, "Failed to load settings");
        e
    })?;

    match args.command {
        Command::List(list_args) => {
            let settings = with_api_override(settings, args.api_url);
            run_list(&settings, list_args).await?
        }
        Command::Search(search_args) => {
            let settings = with_api_override(settings, args.api_url);
            run_search(&settings, search_args).await?
        }
        Command::Show(show_args) => {
            let settings = with_api_override(settings, args.api_url);
            run_show(&settings, show_args).await?
        }
        Command::Linkify(linkify_args) => run_linkify(&settings, linkify_args).await?,
        Command::Settings(command) => run_settings(settings, command, &args.config).await?,
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, millis = elapsed.as_millis() as u64, "Execution complete");
    Ok(())
}

/// `--api-url` applies to this run only and is never written back.
fn with_api_override(mut settings: Settings, api_url: Option<String>) -> Settings {
    if let Some(api_url) = api_url {
        debug!(%api_url, "Overriding API base URL");
        settings.api_base_url = api_url;
    }
    settings
}

async fn prepare_output(out: &Path) -> Result<(), Box<dyn Error>> {
    let out_str = out.to_string_lossy();
    if let Err(e) = ensure_writable_dir(&out_str).await {
        error!(
            path = %out_str,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }
    Ok(())
}

/// Output switches shared by `list` and `search`.
struct PageOutputs<'a> {
    settings: &'a Settings,
    linkifier: Linkifier,
    out: &'a Path,
    json: bool,
    details: bool,
}

impl PageOutputs<'_> {
    /// Write one listing page and its optional JSON and detail pages.
    /// Returns the number of detail pages that failed and were skipped.
    async fn write(
        &self,
        page: &ArticlePage,
        query: &ListQuery,
        rendered: &RangeInclusive<usize>,
    ) -> Result<usize, Box<dyn Error>> {
        html::write_home(page, query, self.settings, rendered, self.out).await?;
        if self.json {
            json::write_page(page, &self.linkifier, self.out).await?;
        }

        let mut detail_failures = 0usize;
        if self.details {
            for article in &page.articles {
                if let Err(e) = html::write_detail(article, self.settings, self.out).await {
                    warn!(id = %article.id, error = %e, "Failed to write detail page; skipping");
                    detail_failures += 1;
                }
            }
        }
        Ok(detail_failures)
    }
}

#[instrument(level = "info", skip_all, fields(offset = list_args.offset, pages = list_args.pages))]
async fn run_list(settings: &Settings, list_args: ListArgs) -> Result<(), Box<dyn Error>> {
    prepare_output(&list_args.out).await?;

    let client = NewsClient::connect(&settings.api_base_url, settings.page_size)?;
    let mut query = ListQuery {
        offset: list_args.offset,
        keyword: list_args.keyword,
        sort: list_args.sort.unwrap_or(settings.default_sort),
        sentiment: list_args.sentiment.unwrap_or(settings.default_sentiment),
    };
    info!(sort = %query.sort, sentiment = %query.sentiment, keyword = %query.keyword, "Listing articles");

    let outputs = PageOutputs {
        settings,
        linkifier: settings.linkifier(),
        out: &list_args.out,
        json: list_args.json,
        details: list_args.details,
    };
    let mut rendered = 0usize;
    let mut detail_failures = 0usize;
    let mut first_page = None;

    for _ in 0..list_args.pages {
        let page = client.fetch_articles(&query).await?;
        // Pages this run can write, counted from the first page fetched.
        let first = *first_page.get_or_insert(page.pagination.current_page());
        let planned = first..=first.saturating_add(list_args.pages as usize - 1);

        detail_failures += outputs.write(&page, &query, &planned).await?;
        rendered += 1;

        match page.pagination.next_offset() {
            Some(next) => query.offset = next,
            None => break,
        }
    }

    info!(pages = rendered, detail_failures, out = %list_args.out.display(), "Listing rendered");
    Ok(())
}

#[instrument(level = "info", skip_all, fields(query = %search_args.query))]
async fn run_search(settings: &Settings, search_args: SearchArgs) -> Result<(), Box<dyn Error>> {
    prepare_output(&search_args.out).await?;

    let client = NewsClient::connect(&settings.api_base_url, settings.page_size)?;
    let query = ListQuery {
        offset: 0,
        keyword: search_args.query,
        sort: search_args.sort.unwrap_or(settings.default_sort),
        sentiment: search_args.sentiment.unwrap_or(settings.default_sentiment),
    };

    let mut articles = client.browse(&query.keyword, query.sentiment).await?;
    query.sort.sort(&mut articles);
    let found = articles.len();
    let pages = ArticlePage::split(articles, client.page_size());
    let planned = 1..=pages.len();

    let outputs = PageOutputs {
        settings,
        linkifier: settings.linkifier(),
        out: &search_args.out,
        json: search_args.json,
        details: search_args.details,
    };
    let mut detail_failures = 0usize;
    for page in &pages {
        detail_failures += outputs.write(page, &query, &planned).await?;
    }

    info!(found, pages = pages.len(), detail_failures, out = %search_args.out.display(), "Search rendered");
    Ok(())
}

#[instrument(level = "info", skip_all, fields(id = %show_args.id))]
async fn run_show(settings: &Settings, show_args: ShowArgs) -> Result<(), Box<dyn Error>> {
    prepare_output(&show_args.out).await?;
    let client = NewsClient::connect(&settings.api_base_url, settings.page_size)?;
    let article = client.fetch_by_id(&show_args.id).await?;
    let path = html::write_detail(&article, settings, &show_args.out).await?;
    println!("{}", path.display());
    Ok(())
}

async fn run_linkify(settings: &Settings, linkify_args: LinkifyArgs) -> Result<(), Box<dyn Error>> {
    let mut summary = String::new();
    tokio::io::stdin().read_to_string(&mut summary).await?;
    let summary = summary.trim_end_matches(['\n', '\r']);
    debug!(summary = %truncate_for_log(summary, 120), "Read summary from stdin");

    if linkify_args.explain {
        let effective = normalize_keywords(&linkify_args.keywords);
        info!(
            ?effective,
            dropped = linkify_args.keywords.len().saturating_sub(effective.len()),
            "Effective keyword order"
        );
    }

    println!("{}", settings.linkifier().linkify(summary, &linkify_args.keywords));
    Ok(())
}

async fn run_settings(
    mut settings: Settings,
    command: SettingsCommand,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    match command {
        SettingsCommand::Show => {
            print!("{}", settings.to_yaml()?);
        }
        SettingsCommand::Set { key, value } => {
            settings.set(&key, &value).map_err(|e| {
                error!(%key, %value, error = %e, "Rejected setting");
                e
            })?;
            settings.save(path).await?;
            info!(%key, %value, path = %path.display(), "Setting updated");
        }
    }
    Ok(())
}
