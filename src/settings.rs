//! Persisted display preferences.
//!
//! Preferences live in a small YAML file next to wherever the reader is run
//! (or wherever `--config` points). A missing file means defaults, and any
//! key left out of the file falls back to its own default.
//!
//! ```yaml
//! api_base_url: http://127.0.0.1:5001
//! default_sentiment: all
//! default_sort: desc
//! dark_mode: false
//! page_size: 10
//! reference_base_url: https://en.wikipedia.org/wiki/
//! ```

use crate::linkify::{DEFAULT_REFERENCE_BASE, Linkifier};
use crate::models::{SentimentFilter, SortOrder};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Default location of the preferences file.
pub const DEFAULT_SETTINGS_FILE: &str = "news_reader.yaml";

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5001";

const DEFAULT_PAGE_SIZE: usize = 10;

/// Display and connection preferences.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Root URL of the sentiment API.
    pub api_base_url: String,
    /// Sentiment filter applied when `list` is run without `--sentiment`.
    pub default_sentiment: SentimentFilter,
    /// Sort order applied when `list` is run without `--sort`.
    pub default_sort: SortOrder,
    /// Render pages with the `dark` class on the root element.
    pub dark_mode: bool,
    /// Articles requested per page.
    pub page_size: usize,
    /// Prefix for entity reference links in summaries.
    pub reference_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            default_sentiment: SentimentFilter::All,
            default_sort: SortOrder::Desc,
            dark_mode: false,
            page_size: DEFAULT_PAGE_SIZE,
            reference_base_url: DEFAULT_REFERENCE_BASE.to_string(),
        }
    }
}

/// Reasons a preference cannot be loaded or changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    UnknownKey(String),
    InvalidValue { key: String, reason: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::UnknownKey(key) => write!(
                f,
                "unknown setting: {key} (expected one of {})",
                Settings::KEYS.join(", ")
            ),
            SettingsError::InvalidValue { key, reason } => {
                write!(f, "invalid value for {key}: {reason}")
            }
        }
    }
}

impl Error for SettingsError {}

fn invalid(key: &str, reason: impl fmt::Display) -> SettingsError {
    SettingsError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// The reference base is pasted into every summary link, so only the
/// percent-encoded serialization of the URL is kept.
fn normalized_reference_base(value: &str) -> Result<String, SettingsError> {
    let url = url::Url::parse(value).map_err(|e| invalid("reference_base_url", e))?;
    Ok(url.to_string())
}

impl Settings {
    /// Names accepted by [`Settings::set`].
    pub const KEYS: [&'static str; 6] = [
        "api_base_url",
        "default_sentiment",
        "default_sort",
        "dark_mode",
        "page_size",
        "reference_base_url",
    ];

    /// Parse settings from YAML text. An empty document yields defaults.
    pub fn from_yaml(text: &str) -> Result<Self, Box<dyn Error>> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(text)?;
        Ok(settings.validated()?)
    }

    pub fn to_yaml(&self) -> Result<String, Box<dyn Error>> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn validated(mut self) -> Result<Self, SettingsError> {
        if self.page_size == 0 {
            return Err(invalid("page_size", "must be at least 1"));
        }
        url::Url::parse(&self.api_base_url).map_err(|e| invalid("api_base_url", e))?;
        self.reference_base_url = normalized_reference_base(&self.reference_base_url)?;
        Ok(self)
    }

    /// Load settings from `path`, falling back to defaults when the file
    /// does not exist.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        match fs::read_to_string(path).await {
            Ok(text) => {
                let settings = Self::from_yaml(&text)?;
                debug!(?settings, "Loaded settings");
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings file; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Write settings to `path` as YAML, creating parent directories.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, self.to_yaml()?).await?;
        info!("Saved settings");
        Ok(())
    }

    /// Change one preference from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let value = value.trim();
        match key {
            "api_base_url" => {
                url::Url::parse(value).map_err(|e| invalid(key, e))?;
                self.api_base_url = value.to_string();
            }
            "default_sentiment" => {
                self.default_sentiment = value.parse().map_err(|e| invalid(key, e))?;
            }
            "default_sort" => {
                self.default_sort = value.parse().map_err(|e| invalid(key, e))?;
            }
            "dark_mode" => {
                self.dark_mode = value.parse().map_err(|e| invalid(key, e))?;
            }
            "page_size" => {
                let size: usize = value.parse().map_err(|e| invalid(key, e))?;
                if size == 0 {
                    return Err(invalid(key, "must be at least 1"));
                }
                self.page_size = size;
            }
            "reference_base_url" => {
                self.reference_base_url = normalized_reference_base(value)?;
            }
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Linkifier pointing at the configured reference site.
    pub fn linkifier(&self) -> Linkifier {
        Linkifier::new(self.reference_base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_base_url, "http://127.0.0.1:5001");
        assert_eq!(settings.default_sentiment, SentimentFilter::All);
        assert_eq!(settings.default_sort, SortOrder::Desc);
        assert!(!settings.dark_mode);
        assert_eq!(settings.page_size, 10);
        assert_eq!(settings.reference_base_url, "https://en.wikipedia.org/wiki/");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let settings = Settings::from_yaml("dark_mode: true\ndefault_sentiment: negative\n").unwrap();
        assert!(settings.dark_mode);
        assert_eq!(
            settings.default_sentiment,
            SentimentFilter::Only(Sentiment::Negative)
        );
        assert_eq!(settings.default_sort, SortOrder::Desc);
        assert_eq!(settings.page_size, 10);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_zero_page_size_rejected_on_load() {
        assert!(Settings::from_yaml("page_size: 0").is_err());
    }

    #[test]
    fn test_bad_sentiment_rejected_on_load() {
        assert!(Settings::from_yaml("default_sentiment: elated").is_err());
    }

    #[test]
    fn test_set_values() {
        let mut settings = Settings::default();
        settings.set("dark_mode", "true").unwrap();
        settings.set("default_sort", "asc").unwrap();
        settings.set("default_sentiment", "positive").unwrap();
        settings.set("page_size", "25").unwrap();
        settings.set("api_base_url", "https://news.example.com").unwrap();

        assert!(settings.dark_mode);
        assert_eq!(settings.default_sort, SortOrder::Asc);
        assert_eq!(
            settings.default_sentiment,
            SentimentFilter::Only(Sentiment::Positive)
        );
        assert_eq!(settings.page_size, 25);
        assert_eq!(settings.api_base_url, "https://news.example.com");
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.set("colour", "blue"),
            Err(SettingsError::UnknownKey("colour".to_string()))
        );
        assert!(settings.set("page_size", "0").is_err());
        assert!(settings.set("dark_mode", "maybe").is_err());
        assert!(settings.set("api_base_url", "not a url").is_err());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_unknown_key_lists_known_keys() {
        let err = Settings::default().set("theme", "dark").unwrap_err();
        assert!(err.to_string().starts_with("unknown setting: theme (expected one of api_base_url,"));
    }

    #[test]
    fn test_every_listed_key_is_settable() {
        let values = ["http://localhost:5001", "all", "desc", "false", "10", "https://en.wikipedia.org/wiki/"];
        let mut settings = Settings::default();
        for (key, value) in Settings::KEYS.iter().zip(values) {
            settings.set(key, value).unwrap();
        }
        assert_eq!(settings.api_base_url, "http://localhost:5001");
    }

    #[test]
    fn test_linkifier_uses_reference_base() {
        let mut settings = Settings::default();
        settings
            .set("reference_base_url", "https://de.wikipedia.org/wiki/")
            .unwrap();
        assert_eq!(
            settings.linkifier().base_url(),
            "https://de.wikipedia.org/wiki/"
        );
    }

    #[test]
    fn test_reference_base_is_stored_normalized() {
        let hostile = r#"https://x.org/wiki/" onmouseover="alert(1)" x=""#;

        let mut settings = Settings::default();
        settings.set("reference_base_url", hostile).unwrap();
        assert!(!settings.reference_base_url.contains('"'));
        assert!(!settings.reference_base_url.contains(' '));

        let linked = settings.linkifier().linkify("NASA flew", &["NASA"]);
        assert!(!linked.contains("onmouseover=\""));
        assert!(linked.starts_with(r#"<a href="https://x.org/wiki/%22"#));

        let yaml = format!("reference_base_url: '{hostile}'\n");
        let loaded = Settings::from_yaml(&yaml).unwrap();
        assert_eq!(loaded.reference_base_url, settings.reference_base_url);
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings::load(tmp.path().join("absent.yaml")).await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("conf/news_reader.yaml");

        let mut settings = Settings::default();
        settings.set("dark_mode", "true").unwrap();
        settings.set("default_sentiment", "neutral").unwrap();
        settings.save(&path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("default_sentiment: neutral"));

        let loaded = Settings::load(&path).await.unwrap();
        assert_eq!(loaded, settings);
    }
}
