//! Sentiment API client with exponential backoff retry logic.
//!
//! This module fetches articles from the sentiment API. Every request goes
//! through a retry decorator so that a briefly unavailable backend does not
//! abort a render.
//!
//! # Architecture
//!
//! - [`FetchAsync`]: Core trait for fetching a URL
//! - [`HttpFetch`]: `reqwest`-backed implementation
//! - [`RetryFetch`]: Decorator that adds retry logic to any `FetchAsync` implementation
//! - [`NewsClient`]: Typed endpoints on top of a `FetchAsync`
//!
//! # Endpoints
//!
//! | Call | Path |
//! |------|------|
//! | [`NewsClient::fetch_articles`] | `/sentiment?offset=&page_size=&keyword=&sort=&category=` |
//! | [`NewsClient::fetch_by_sentiment`] | `/sentiment/{sentiment}` |
//! | [`NewsClient::search`] | `/sentiment/search?query=` |
//! | [`NewsClient::fetch_by_id`] | `/sentiment/{id}` |
//!
//! # Retry Strategy
//!
//! - Maximum 3 retry attempts
//! - Exponential backoff starting at 500 milliseconds
//! - Maximum delay capped at 10 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::models::{Article, ArticleList, ArticlePage, Sentiment, SentimentFilter, SortOrder};
use crate::utils::{looks_truncated, truncate_for_log};
use rand::{Rng, rng};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Trait for async retrieval of a URL.
///
/// Implementors fetch a resource and return its body. This abstraction
/// allows for different transports or decorators (like retry logic).
pub trait FetchAsync {
    /// The type of response body returned.
    type Response;

    /// Fetch `url` and return its body, or an error if the request failed.
    async fn fetch(&self, url: &Url) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchAsync`] implementation.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    /// The underlying transport to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: FetchAsync,
{
    /// Create a new retry wrapper around an existing [`FetchAsync`] implementation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let http = HttpFetch::new()?;
    /// let retrying = RetryFetch::new(http, 3, Duration::from_millis(500));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(10),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FetchAsync for RetryFetch<T>
where
    T: FetchAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.fetch(url).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch() exhausted retries"
                        );
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Plain HTTP GET over `reqwest`; non-2xx statuses are errors.
#[derive(Debug, Clone)]
pub struct HttpFetch {
    client: reqwest::Client,
}

impl HttpFetch {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(StdDuration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

impl FetchAsync for HttpFetch {
    type Response = String;

    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = async {
            let resp = self.client.get(url.clone()).send().await?.error_for_status()?;
            Ok::<String, reqwest::Error>(resp.text().await?)
        }
        .await;
        let dt = t0.elapsed();

        match res {
            Ok(body) => {
                debug!(elapsed_ms = dt.as_millis() as u64, bytes = body.len(), "GET succeeded");
                Ok(body)
            }
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "GET failed");
                Err(Box::new(e))
            }
        }
    }
}

/// Parameters of a paged listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub offset: usize,
    /// Free-text filter; empty means no filter.
    pub keyword: String,
    pub sort: SortOrder,
    pub sentiment: SentimentFilter,
}

/// Typed access to the sentiment API.
#[derive(Debug)]
pub struct NewsClient<F> {
    fetcher: F,
    base_url: Url,
    page_size: usize,
}

impl NewsClient<RetryFetch<HttpFetch>> {
    /// Client for `base_url` over HTTP with the default retry policy.
    pub fn connect(base_url: &str, page_size: usize) -> Result<Self, Box<dyn Error>> {
        let fetcher = RetryFetch::new(HttpFetch::new()?, 3, StdDuration::from_millis(500));
        Self::new(fetcher, base_url, page_size)
    }
}

impl<F> NewsClient<F>
where
    F: FetchAsync<Response = String>,
{
    pub fn new(fetcher: F, base_url: &str, page_size: usize) -> Result<Self, Box<dyn Error>> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(format!("API base URL cannot carry paths: {base_url}").into());
        }
        Ok(Self {
            fetcher,
            base_url,
            page_size: page_size.max(1),
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `{base}/sentiment/{segments...}` with each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("sentiment").extend(segments);
        }
        url
    }

    /// URL of a paged listing. Empty keyword and `all` sentiment are omitted.
    pub fn list_url(&self, query: &ListQuery) -> Url {
        let mut url = self.endpoint(&[]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("offset", &query.offset.to_string())
                .append_pair("page_size", &self.page_size.to_string())
                .append_pair("sort", query.sort.as_str());
            let keyword = query.keyword.trim();
            if !keyword.is_empty() {
                pairs.append_pair("keyword", keyword);
            }
            let category = query.sentiment.as_query();
            if !category.is_empty() {
                pairs.append_pair("category", category);
            }
        }
        url
    }

    /// Fetch `url` and decode it, fetching once more if the body was cut short.
    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, Box<dyn Error>> {
        let body = self.fetcher.fetch(url).await?;
        match serde_json::from_str::<T>(&body) {
            Ok(value) => Ok(value),
            Err(e) if looks_truncated(&e) => {
                warn!(%url, error = %e, "EOF while parsing; fetching once more");
                let body = self.fetcher.fetch(url).await?;
                Ok(serde_json::from_str::<T>(&body)?)
            }
            Err(e) => {
                warn!(
                    %url,
                    error = %e,
                    response_preview = %truncate_for_log(&body, 300),
                    "API returned non-conforming JSON"
                );
                Err(Box::new(e))
            }
        }
    }

    /// One page of articles filtered, searched and sorted server-side.
    #[instrument(level = "info", skip_all, fields(offset = query.offset, keyword = %query.keyword, sort = %query.sort, sentiment = %query.sentiment))]
    pub async fn fetch_articles(&self, query: &ListQuery) -> Result<ArticlePage, Box<dyn Error>> {
        let url = self.list_url(query);
        let list: ArticleList = self.get_json(&url).await?;
        let page = list.into_page(self.page_size);
        info!(
            count = page.articles.len(),
            total = page.pagination.total,
            has_more = page.pagination.has_more,
            "Fetched article page"
        );
        Ok(page)
    }

    /// Every article the API has, unpaged.
    #[instrument(level = "info", skip_all)]
    pub async fn fetch_all(&self) -> Result<Vec<Article>, Box<dyn Error>> {
        let list: ArticleList = self.get_json(&self.endpoint(&[])).await?;
        info!(count = list.articles.len(), "Fetched all articles");
        Ok(list.articles)
    }

    /// All articles carrying `sentiment`.
    #[instrument(level = "info", skip_all, fields(%sentiment))]
    pub async fn fetch_by_sentiment(
        &self,
        sentiment: Sentiment,
    ) -> Result<Vec<Article>, Box<dyn Error>> {
        let url = self.endpoint(&[sentiment.as_str()]);
        let list: ArticleList = self.get_json(&url).await?;
        info!(count = list.articles.len(), "Fetched articles by sentiment");
        Ok(list.articles)
    }

    /// Server-side keyword search.
    #[instrument(level = "info", skip_all, fields(%query))]
    pub async fn search(&self, query: &str) -> Result<Vec<Article>, Box<dyn Error>> {
        let mut url = self.endpoint(&["search"]);
        url.query_pairs_mut().append_pair("query", query);
        let list: ArticleList = self.get_json(&url).await?;
        info!(count = list.articles.len(), "Fetched search results");
        Ok(list.articles)
    }

    /// Unpaged lookup: a non-empty `query` goes to the search endpoint and
    /// is narrowed to `sentiment` afterwards; otherwise the sentiment
    /// endpoint or the full listing is used.
    #[instrument(level = "info", skip_all, fields(%query, %sentiment))]
    pub async fn browse(
        &self,
        query: &str,
        sentiment: SentimentFilter,
    ) -> Result<Vec<Article>, Box<dyn Error>> {
        let query = query.trim();
        if !query.is_empty() {
            let mut articles = self.search(query).await?;
            let before = articles.len();
            articles.retain(|a| sentiment.matches(a.sentiment));
            debug!(kept = articles.len(), dropped = before - articles.len(), "Filtered search results by sentiment");
            return Ok(articles);
        }
        match sentiment {
            SentimentFilter::Only(s) => self.fetch_by_sentiment(s).await,
            SentimentFilter::All => self.fetch_all().await,
        }
    }

    /// A single article by identifier.
    #[instrument(level = "info", skip_all, fields(%id))]
    pub async fn fetch_by_id(&self, id: &str) -> Result<Article, Box<dyn Error>> {
        let url = self.endpoint(&[id]);
        let article: Article = self.get_json(&url).await?;
        info!(headline = %article.headline, "Fetched article");
        Ok(article)
    }
}
