//! Command-line interface definitions for the news reader.
//!
//! This module defines the CLI arguments and subcommands using the `clap` crate.
//! Options not given on the command line fall back to environment variables
//! and then to the persisted settings file.

use crate::models::{SentimentFilter, SortOrder};
use crate::settings::DEFAULT_SETTINGS_FILE;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the news reader.
///
/// # Examples
///
/// ```sh
/// # Render the first page of negative articles about rates
/// sentiment_news_reader list -q rates --sentiment negative --out ./site
///
/// # Render every positive article, split into local pages
/// sentiment_news_reader search --sentiment positive --out ./site
///
/// # Render one article
/// sentiment_news_reader show 65f1c0 --out ./site
///
/// # Linkify a summary from stdin
/// echo "NASA and SpaceX" | sentiment_news_reader linkify -k NASA -k SpaceX
///
/// # Turn dark mode on
/// sentiment_news_reader settings set dark_mode true
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the settings YAML file
    #[arg(short, long, env = "NEWS_READER_CONFIG", default_value = DEFAULT_SETTINGS_FILE, global = true)]
    pub config: PathBuf,

    /// Override the API base URL from settings
    #[arg(long, env = "NEWS_API_URL", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch article pages and render them as HTML
    List(ListArgs),
    /// Fetch an unpaged search or sentiment listing and render it locally
    Search(SearchArgs),
    /// Fetch one article and render its detail page
    Show(ShowArgs),
    /// Linkify a summary read from stdin and print the markup
    Linkify(LinkifyArgs),
    /// Inspect or change persisted preferences
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Offset of the first article
    #[arg(short, long, default_value_t = 0)]
    pub offset: usize,

    /// Keyword to search for
    #[arg(short = 'q', long, default_value = "")]
    pub keyword: String,

    /// Sort order (asc or desc); defaults to the saved preference
    #[arg(short, long)]
    pub sort: Option<SortOrder>,

    /// Sentiment filter (all, positive, neutral, negative); defaults to the saved preference
    #[arg(long)]
    pub sentiment: Option<SentimentFilter>,

    /// Number of consecutive pages to render
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Also render a detail page for every listed article
    #[arg(long)]
    pub details: bool,

    /// Also write each page as JSON with linkified summaries
    #[arg(long)]
    pub json: bool,

    /// Output directory for rendered files
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to search for; leave empty to list every article
    #[arg(default_value = "")]
    pub query: String,

    /// Sort order (asc or desc); defaults to the saved preference
    #[arg(short, long)]
    pub sort: Option<SortOrder>,

    /// Sentiment filter (all, positive, neutral, negative); defaults to the saved preference
    #[arg(long)]
    pub sentiment: Option<SentimentFilter>,

    /// Also render a detail page for every article found
    #[arg(long)]
    pub details: bool,

    /// Also write each page as JSON with linkified summaries
    #[arg(long)]
    pub json: bool,

    /// Output directory for rendered files
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Article identifier
    pub id: String,

    /// Output directory for the rendered page
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct LinkifyArgs {
    /// Keyword to link; repeat for several
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    /// Log the effective keyword order before linkifying
    #[arg(long)]
    pub explain: bool,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print the effective settings as YAML
    Show,
    /// Change one setting and save the file
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;

    #[test]
    fn test_list_parsing() {
        let cli = Cli::parse_from([
            "sentiment_news_reader",
            "list",
            "-q",
            "rates",
            "--sentiment",
            "negative",
            "--sort",
            "asc",
            "--out",
            "./site",
        ]);

        match cli.command {
            Command::List(args) => {
                assert_eq!(args.keyword, "rates");
                assert_eq!(args.sentiment, Some(SentimentFilter::Only(Sentiment::Negative)));
                assert_eq!(args.sort, Some(SortOrder::Asc));
                assert_eq!(args.offset, 0);
                assert_eq!(args.pages, 1);
                assert!(!args.json);
                assert_eq!(args.out, PathBuf::from("./site"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_list_defaults_leave_preferences_unset() {
        let cli = Cli::parse_from(["sentiment_news_reader", "list", "--out", "/tmp/site"]);
        match cli.command {
            Command::List(args) => {
                assert_eq!(args.sort, None);
                assert_eq!(args.sentiment, None);
                assert_eq!(args.keyword, "");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_list_rejects_zero_pages_and_bad_sentiment() {
        assert!(Cli::try_parse_from(["sentiment_news_reader", "list", "--out", "x", "-p", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["sentiment_news_reader", "list", "--out", "x", "--sentiment", "meh"])
                .is_err()
        );
    }

    #[test]
    fn test_linkify_parsing() {
        let cli = Cli::parse_from([
            "sentiment_news_reader",
            "linkify",
            "-k",
            "NASA",
            "--keyword",
            "New York",
            "--explain",
        ]);
        match cli.command {
            Command::Linkify(args) => {
                assert_eq!(args.keywords, vec!["NASA", "New York"]);
                assert!(args.explain);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_settings_set_with_global_config() {
        let cli = Cli::parse_from([
            "sentiment_news_reader",
            "settings",
            "set",
            "dark_mode",
            "true",
            "--config",
            "/tmp/prefs.yaml",
        ]);
        assert_eq!(cli.config, PathBuf::from("/tmp/prefs.yaml"));
        match cli.command {
            Command::Settings(SettingsCommand::Set { key, value }) => {
                assert_eq!(key, "dark_mode");
                assert_eq!(value, "true");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_search_parsing() {
        let cli = Cli::parse_from([
            "sentiment_news_reader",
            "search",
            "New York",
            "--sentiment",
            "neutral",
            "--out",
            "site",
        ]);
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.query, "New York");
                assert_eq!(args.sentiment, Some(SentimentFilter::Only(Sentiment::Neutral)));
                assert_eq!(args.sort, None);
                assert!(!args.details);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::parse_from(["sentiment_news_reader", "search", "--out", "site"]);
        match cli.command {
            Command::Search(args) => assert_eq!(args.query, ""),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_show_parsing() {
        let cli = Cli::parse_from(["sentiment_news_reader", "show", "abc123", "--out", "site"]);
        match cli.command {
            Command::Show(args) => assert_eq!(args.id, "abc123"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
