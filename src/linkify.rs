//! Keyword linkification for article summaries.
//!
//! Summaries arrive as plain text together with the entity names extracted
//! for the article. [`linkify`] escapes the text for HTML and wraps every
//! entity occurrence in an outbound reference link (Wikipedia by default).
//!
//! # Matching rules
//!
//! - Keywords are deduplicated, trimmed, and anything of one character or
//!   less is dropped.
//! - Longer keywords are tried first, so `"Apple Inc"` wins over `"Apple"`.
//! - Matching is case-insensitive and anchored on word boundaries, so `"AI"`
//!   never matches inside `"fail"`.
//! - The anchor text keeps the casing found in the summary.
//!
//! The output is meant to be injected as trusted HTML. Run it exactly once
//! per raw summary: feeding linkified output back in would escape the
//! anchors it inserted.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::{Captures, Regex, RegexBuilder};
use crate::utils::escape_html;
use tracing::{debug, warn};

/// Reference site used when no other base URL is configured.
pub const DEFAULT_REFERENCE_BASE: &str = "https://en.wikipedia.org/wiki/";

// Character references that may already sit in the escaped summary.
const ENTITY_PATTERN: &str = r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);";

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Builds reference links against a configurable base URL.
///
/// The linkifier itself holds no per-call state; it is cheap to construct
/// and safe to share between threads.
#[derive(Debug, Clone)]
pub struct Linkifier {
    base_url: String,
}

impl Default for Linkifier {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_BASE)
    }
}

impl Linkifier {
    /// Create a linkifier whose anchors point at `base_url` followed by the
    /// encoded match, e.g. `https://en.wikipedia.org/wiki/New_York`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Escape `summary` and wrap every keyword occurrence in a reference link.
    ///
    /// Returns an empty string for an empty summary and the escaped summary
    /// unchanged when no usable keyword remains after normalization.
    pub fn linkify<S: AsRef<str>>(&self, summary: &str, keywords: &[S]) -> String {
        if summary.is_empty() {
            return String::new();
        }

        let safe = escape_angle_brackets(summary);

        let keywords = normalize_keywords(keywords);
        if keywords.is_empty() {
            return safe;
        }

        let re = match build_pattern(&keywords) {
            Ok(re) => re,
            Err(e) => {
                warn!(error = %e, keywords = keywords.len(), "Keyword pattern rejected; leaving summary unlinked");
                return safe;
            }
        };

        re.replace_all(&safe, |caps: &Captures<'_>| {
            let matched = &caps[0];
            if caps.name("entity").is_some() {
                matched.to_string()
            } else {
                self.anchor(matched)
            }
        })
        .into_owned()
    }

    /// Reference URL for a matched phrase: whitespace runs become `_`, then
    /// the phrase is percent-encoded and appended to the base URL.
    pub fn reference_url(&self, matched: &str) -> String {
        let title = WHITESPACE_RUN.replace_all(matched, "_");
        format!("{}{}", self.base_url, urlencoding::encode(&title))
    }

    fn anchor(&self, matched: &str) -> String {
        format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer"><strong>{}</strong></a>"#,
            escape_html(&self.reference_url(matched)),
            matched
        )
    }
}

/// Linkify `summary` against the default reference site.
pub fn linkify<S: AsRef<str>>(summary: &str, keywords: &[S]) -> String {
    Linkifier::default().linkify(summary, keywords)
}

/// The effective keyword list used for matching: unique, trimmed, longer
/// than one character, longest first. Ties keep their first-seen order.
pub fn normalize_keywords<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    let mut out = keywords
        .iter()
        .map(<S as AsRef<str>>::as_ref)
        .unique()
        .map(str::trim)
        .filter(|k| k.chars().count() > 1)
        .unique()
        .map(str::to_string)
        .collect::<Vec<String>>();
    out.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    debug!(count = out.len(), "Normalized keywords");
    out
}

fn escape_angle_brackets(s: &str) -> String {
    s.replace('<', "&lt;").replace('>', "&gt;")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// One alternative per keyword, each escaped for literal matching. A `\b`
/// is only asserted on an edge that is itself a word character; `\b` next
/// to `+` in `C++` would otherwise require a following letter.
fn keyword_alternative(keyword: &str) -> String {
    let mut alt = String::with_capacity(keyword.len() + 8);
    if keyword.chars().next().is_some_and(is_word_char) {
        alt.push_str(r"\b");
    }
    alt.push_str(&regex::escape(keyword));
    if keyword.chars().last().is_some_and(is_word_char) {
        alt.push_str(r"\b");
    }
    alt
}

/// Entities come first in the alternation so a match starting at `&` is
/// consumed whole and keywords like `lt` cannot split `&lt;`.
fn build_pattern(keywords: &[String]) -> Result<Regex, regex::Error> {
    let alternatives = keywords.iter().map(|k| keyword_alternative(k)).join("|");
    let pattern = format!("(?P<entity>{ENTITY_PATTERN})|(?:{alternatives})");
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_KEYWORDS: [&str; 0] = [];

    fn anchor_count(html: &str) -> usize {
        html.matches("<a href=").count()
    }

    #[test]
    fn test_empty_summary_yields_empty_output() {
        assert_eq!(linkify("", &["Apple", "NASA"]), "");
        assert_eq!(linkify("", &NO_KEYWORDS), "");
    }

    #[test]
    fn test_no_keywords_returns_escaped_summary() {
        let out = linkify("1 < 2 and <b>bold</b>", &NO_KEYWORDS);
        assert_eq!(out, "1 &lt; 2 and &lt;b&gt;bold&lt;/b&gt;");
        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
    }

    #[test]
    fn test_only_short_keywords_short_circuits() {
        let out = linkify("a <tag> b", &["a", " b ", "", "   "]);
        assert_eq!(out, "a &lt;tag&gt; b");
    }

    #[test]
    fn test_markup_is_escaped_around_links() {
        let out = linkify("<script>NASA</script>", &["NASA"]);
        assert!(out.starts_with("&lt;script&gt;<a href="));
        assert!(out.ends_with("</a>&lt;/script&gt;"));
        assert_eq!(anchor_count(&out), 1);
    }

    #[test]
    fn test_longer_keyword_wins() {
        let out = linkify(
            "Apple and Apple Inc announced a product",
            &["Apple", "Apple Inc"],
        );
        assert_eq!(anchor_count(&out), 2);
        assert!(out.contains("<strong>Apple Inc</strong>"));
        assert!(out.contains("wiki/Apple_Inc\""));
        assert!(!out.contains("<strong>Inc</strong>"));
        assert!(out.starts_with(
            r#"<a href="https://en.wikipedia.org/wiki/Apple" target="_blank" rel="noopener noreferrer"><strong>Apple</strong></a> and "#
        ));
    }

    #[test]
    fn test_longer_keyword_wins_regardless_of_input_order() {
        let a = linkify("New York is big", &["New", "New York"]);
        let b = linkify("New York is big", &["New York", "New"]);
        assert_eq!(a, b);
        assert_eq!(anchor_count(&a), 1);
        assert!(a.contains("<strong>New York</strong>"));
    }

    #[test]
    fn test_word_boundaries_are_enforced() {
        let out = linkify("AI helped the team fail fast", &["ai"]);
        assert_eq!(anchor_count(&out), 1);
        assert!(out.starts_with(r#"<a href="https://en.wikipedia.org/wiki/AI""#));
        assert!(out.contains("<strong>AI</strong>"));
        assert!(out.ends_with(" helped the team fail fast"));
    }

    #[test]
    fn test_no_match_inside_longer_word() {
        let out = linkify("Air travel resumed", &["ai"]);
        assert_eq!(out, "Air travel resumed");
    }

    #[test]
    fn test_pattern_special_characters_match_literally() {
        let out = linkify("Written in C++ and Node.js today", &["C++", "Node.js"]);
        assert_eq!(anchor_count(&out), 2);
        assert!(out.contains("<strong>C++</strong>"));
        assert!(out.contains("wiki/C%2B%2B\""));
        assert!(out.contains("<strong>Node.js</strong>"));
    }

    #[test]
    fn test_dot_is_not_a_wildcard() {
        let out = linkify("Nodexjs is not it", &["Node.js"]);
        assert_eq!(anchor_count(&out), 0);
    }

    #[test]
    fn test_parenthesised_keyword() {
        let out = linkify("Data from (NASA) arrived", &["(NASA)"]);
        assert_eq!(anchor_count(&out), 1);
        assert!(out.contains("<strong>(NASA)</strong>"));
    }

    #[test]
    fn test_duplicates_yield_single_anchor_with_source_casing() {
        let out = linkify("Nasa launched a satellite", &["NASA", "nasa", "NASA"]);
        assert_eq!(anchor_count(&out), 1);
        assert!(out.contains("<strong>Nasa</strong>"));
        assert!(out.contains("wiki/Nasa\""));
    }

    #[test]
    fn test_single_character_keyword_never_matches() {
        let out = linkify("a cat and a dog", &["a"]);
        assert_eq!(out, "a cat and a dog");
    }

    #[test]
    fn test_whitespace_runs_become_underscores() {
        let out = linkify("Flights to New   York resumed", &["New   York"]);
        assert!(out.contains("href=\"https://en.wikipedia.org/wiki/New_York\""));
        assert!(out.contains("<strong>New   York</strong>"));

        let out = linkify("Flights to New York resumed", &["new york"]);
        assert!(out.contains("wiki/New_York\""));
    }

    #[test]
    fn test_href_is_percent_encoded() {
        let out = linkify("Visit São Paulo soon", &["São Paulo"]);
        assert!(out.contains("wiki/S%C3%A3o_Paulo\""));
        assert!(out.contains("<strong>São Paulo</strong>"));
    }

    #[test]
    fn test_anchor_opens_without_opener() {
        let out = linkify("NASA", &["NASA"]);
        assert_eq!(
            out,
            r#"<a href="https://en.wikipedia.org/wiki/NASA" target="_blank" rel="noopener noreferrer"><strong>NASA</strong></a>"#
        );
    }

    #[test]
    fn test_keywords_are_trimmed() {
        let out = linkify("The EU voted", &["  EU  "]);
        assert_eq!(anchor_count(&out), 1);
        assert!(out.contains("<strong>EU</strong>"));
    }

    #[test]
    fn test_existing_entities_are_not_split() {
        let out = linkify("AT&amp;T and 3 < 4", &["amp", "lt", "AT"]);
        assert!(out.contains("&amp;T"));
        assert!(out.contains("3 &lt; 4"));
        assert_eq!(anchor_count(&out), 1);
        assert!(out.starts_with(r#"<a href="https://en.wikipedia.org/wiki/AT""#));
    }

    #[test]
    fn test_every_occurrence_is_linked() {
        let out = linkify("Mars, then mars, then MARS.", &["Mars"]);
        assert_eq!(anchor_count(&out), 3);
        assert!(out.contains("<strong>mars</strong>"));
        assert!(out.contains("<strong>MARS</strong>"));
    }

    #[test]
    fn test_custom_reference_base() {
        let linker = Linkifier::new("https://example.org/ref/");
        let out = linker.linkify("Ask NASA", &["NASA"]);
        assert!(out.contains(r#"href="https://example.org/ref/NASA""#));
        assert_eq!(linker.base_url(), "https://example.org/ref/");
    }

    #[test]
    fn test_quote_in_base_url_stays_inside_href() {
        let linkifier = Linkifier::new(r#"https://x.org/wiki/" onmouseover="alert(1)" x=""#);
        let out = linkifier.linkify("NASA flew", &["NASA"]);
        assert!(!out.contains(r#"" onmouseover=""#));
        assert!(out.starts_with(
            r#"<a href="https://x.org/wiki/&quot; onmouseover=&quot;alert(1)&quot; x=&quot;NASA" target="_blank""#
        ));
    }

    #[test]
    fn test_normalize_keywords_orders_longest_first() {
        let keywords = normalize_keywords(&["New", "x", " New York ", "New", "NASA", "New York"]);
        assert_eq!(keywords, vec!["New York", "NASA", "New"]);
    }

    #[test]
    fn test_normalize_keywords_counts_characters() {
        let keywords = normalize_keywords(&["é", "ab"]);
        assert_eq!(keywords, vec!["ab"]);
    }

    #[test]
    fn test_anchor_text_is_substring_of_escaped_input() {
        let summary = "The <b>Federal Reserve</b> met the fed";
        let escaped = escape_angle_brackets(summary);
        let out = linkify(summary, &["federal reserve", "Fed"]);
        let label_re = Regex::new(r"<strong>(.*?)</strong>").unwrap();
        let labels: Vec<&str> = label_re
            .captures_iter(&out)
            .map(|c| c.get(1).unwrap().as_str())
            .collect();
        assert_eq!(labels, vec!["Federal Reserve", "fed"]);
        for label in labels {
            assert!(escaped.contains(label));
        }
    }
}
