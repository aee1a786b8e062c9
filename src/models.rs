//! Data models for sentiment-labelled articles and paged listings.
//!
//! This module defines the records exchanged with the sentiment API:
//! - [`Article`]: One article with its sentiment label and extracted entities
//! - [`ArticlePage`]: A page of articles plus its [`Pagination`] window
//! - [`Sentiment`], [`SentimentFilter`], [`SortOrder`]: listing controls
//!
//! Older revisions of the API used `id` instead of `_id` and sometimes sent
//! `entities: null`; both are accepted on input.

use crate::linkify::Linkifier;
use crate::utils::parse_timestamp;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// A categorical sentiment label attached upstream to every article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Wire name, e.g. `"positive"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Display label, e.g. `"Positive"`.
    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }

    /// CSS classes for the badge on an article card.
    pub fn badge_classes(&self) -> &'static str {
        match self {
            Sentiment::Positive => "bg-green-100 text-green-800",
            Sentiment::Neutral => "bg-yellow-100 text-yellow-800",
            Sentiment::Negative => "bg-red-100 text-red-800",
        }
    }

    /// CSS classes for the label on the article detail page.
    pub fn detail_classes(&self) -> &'static str {
        match self {
            Sentiment::Positive => "text-green-600 bg-green-100",
            Sentiment::Neutral => "text-yellow-600 bg-yellow-100",
            Sentiment::Negative => "text-red-600 bg-red-100",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a listing control cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseControlError {
    kind: &'static str,
    value: String,
}

impl fmt::Display for ParseControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.value)
    }
}

impl Error for ParseControlError {}

impl FromStr for Sentiment {
    type Err = ParseControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            _ => Err(ParseControlError {
                kind: "sentiment",
                value: s.to_string(),
            }),
        }
    }
}

/// Which sentiments a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentimentFilter {
    #[default]
    All,
    Only(Sentiment),
}

impl SentimentFilter {
    /// Value sent as the `category` query parameter; empty for [`SentimentFilter::All`].
    pub fn as_query(&self) -> &'static str {
        match self {
            SentimentFilter::All => "",
            SentimentFilter::Only(s) => s.as_str(),
        }
    }

    pub fn matches(&self, sentiment: Sentiment) -> bool {
        match self {
            SentimentFilter::All => true,
            SentimentFilter::Only(s) => *s == sentiment,
        }
    }
}

impl fmt::Display for SentimentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentFilter::All => f.write_str("all"),
            SentimentFilter::Only(s) => f.write_str(s.as_str()),
        }
    }
}

impl FromStr for SentimentFilter {
    type Err = ParseControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(SentimentFilter::All);
        }
        trimmed.parse::<Sentiment>().map(SentimentFilter::Only)
    }
}

impl Serialize for SentimentFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SentimentFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Listing order by publication time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest first.
    #[default]
    Desc,
    /// Oldest first.
    Asc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Desc => "desc",
            SortOrder::Asc => "asc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Desc => "Newest First",
            SortOrder::Asc => "Oldest First",
        }
    }

    /// Order `articles` by publication time. Articles whose timestamp is
    /// missing or unparseable go last either way; ties keep their order.
    pub fn sort(&self, articles: &mut [Article]) {
        let order = *self;
        articles.sort_by(|a, b| {
            let a = a.timestamp.as_deref().and_then(parse_timestamp);
            let b = b.timestamp.as_deref().and_then(parse_timestamp);
            match (a, b) {
                (Some(a), Some(b)) if order == SortOrder::Asc => a.cmp(&b),
                (Some(a), Some(b)) => b.cmp(&a),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ParseControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desc" => Ok(SortOrder::Desc),
            "asc" => Ok(SortOrder::Asc),
            _ => Err(ParseControlError {
                kind: "sort order",
                value: s.to_string(),
            }),
        }
    }
}

/// A single article as served by the sentiment API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    /// Opaque article identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub headline: String,
    /// Link to the original story.
    pub url: String,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Publication time as sent by the API; see [`crate::utils::parse_timestamp`].
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Entity names extracted for this article, used to linkify the summary.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub entities: Vec<String>,
}

impl Article {
    /// The summary escaped and linkified against this article's entities.
    pub fn linked_summary(&self, linkifier: &Linkifier) -> String {
        linkifier.linkify(&self.summary, &self.entities)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Window of a paged listing as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    pub total: usize,
    pub offset: usize,
    pub page_size: usize,
    pub has_more: bool,
}

impl Pagination {
    /// Pagination for a listing returned in one piece.
    pub fn single(count: usize, page_size: usize) -> Self {
        Self {
            total: count,
            offset: 0,
            page_size,
            has_more: false,
        }
    }

    fn step(&self) -> usize {
        self.page_size.max(1)
    }

    /// 1-based page number of this window.
    pub fn current_page(&self) -> usize {
        (self.offset / self.step()).saturating_add(1)
    }

    /// Number of pages; never less than 1.
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.step()).max(1)
    }

    /// Offset of the previous page, or `None` on the first page.
    pub fn prev_offset(&self) -> Option<usize> {
        if self.offset == 0 {
            None
        } else {
            Some(self.offset.saturating_sub(self.step()))
        }
    }

    /// Offset of the next page, or `None` when the API says there is no more
    /// or the offset would overflow.
    pub fn next_offset(&self) -> Option<usize> {
        if !self.has_more {
            return None;
        }
        self.offset.checked_add(self.step())
    }
}

/// A page of articles with its pagination window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub pagination: Pagination,
}

impl ArticlePage {
    /// Split an unpaged result into consecutive pages of `page_size`
    /// articles. An empty result still yields one empty page.
    pub fn split(articles: Vec<Article>, page_size: usize) -> Vec<ArticlePage> {
        let page_size = page_size.max(1);
        let total = articles.len();
        if total == 0 {
            return vec![ArticlePage {
                articles,
                pagination: Pagination::single(0, page_size),
            }];
        }
        articles
            .chunks(page_size)
            .enumerate()
            .map(|(i, chunk)| {
                let offset = i * page_size;
                ArticlePage {
                    articles: chunk.to_vec(),
                    pagination: Pagination {
                        total,
                        offset,
                        page_size,
                        has_more: offset + chunk.len() < total,
                    },
                }
            })
            .collect()
    }
}

/// Raw listing payload; `pagination` is missing on the unpaged endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ArticleList {
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl ArticleList {
    pub(crate) fn into_page(self, page_size: usize) -> ArticlePage {
        let pagination = self
            .pagination
            .unwrap_or_else(|| Pagination::single(self.articles.len(), page_size));
        ArticlePage {
            articles: self.articles,
            pagination,
        }
    }
}
