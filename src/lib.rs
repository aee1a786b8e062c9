//! # Sentiment News Reader
//!
//! A terminal client for a sentiment-labelled news API. It fetches articles
//! with their sentiment labels and extracted entities, and renders them as
//! static HTML pages: a filterable, paginated grid and one detail page per
//! article.
//!
//! The centrepiece is [`linkify`], which escapes a summary for HTML and
//! turns every mention of the article's entities into a reference link.
//!
//! ```
//! use sentiment_news_reader::linkify::linkify;
//!
//! let html = linkify("Flights to New York resumed", &["New York"]);
//! assert!(html.contains("https://en.wikipedia.org/wiki/New_York"));
//! ```

pub mod api;
pub mod cli;
pub mod linkify;
pub mod models;
pub mod outputs;
pub mod settings;
pub mod utils;
