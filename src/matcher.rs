//! Pattern primitives for pulling values out of message bodies.
//!
//! This module provides the [`Matcher`] trait together with the two
//! single-pattern implementations the extractors are built from: a plain
//! [`RegexMatcher`] and the CSS-aware [`FallbackCodeMatcher`].
//!
//! # Example
//!
//! ```
//! use tempmail_confirm::matcher::{FallbackCodeMatcher, Matcher, RegexMatcher};
//!
//! let custom = RegexMatcher::new(r"token=([a-f0-9]+)").unwrap();
//! let text = "Click here: https://example.com?token=abc123";
//! assert_eq!(custom.find_match(text).as_deref(), Some("abc123"));
//!
//! let fallback = FallbackCodeMatcher::default();
//! assert_eq!(fallback.find_match("padding: 2048 then 5150").as_deref(), Some("5150"));
//! ```

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// CSS property names that disqualify an adjacent bare number.
const CSS_PROPERTIES: &str = "margin|padding|width|height";

static CSS_BEFORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{CSS_PROPERTIES})\s*[:=]?\s*$")).expect("valid regex")
});

static CSS_AFTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^\s*(?:{CSS_PROPERTIES})")).expect("valid regex")
});

/// Trait for matching and extracting content from message bodies.
///
/// Implement this trait to plug custom extraction logic into an extractor.
///
/// # Example
///
/// ```
/// use tempmail_confirm::matcher::Matcher;
/// use std::borrow::Cow;
///
/// struct PinLine;
///
/// impl Matcher for PinLine {
///     fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
///         text.lines()
///             .find_map(|line| line.strip_prefix("PIN:"))
///             .map(|pin| Cow::Borrowed(pin.trim()))
///     }
///
///     fn description(&self) -> &str {
///         "PIN line"
///     }
/// }
///
/// assert_eq!(PinLine.find_match("Hi\nPIN: 0042").as_deref(), Some("0042"));
/// ```
pub trait Matcher: Send + Sync {
    /// Attempts to find and extract matching content from the text.
    ///
    /// Returns `Some(matched_value)` if found, `None` otherwise.
    /// Uses `Cow<str>` to avoid allocations when the match can be borrowed
    /// directly from the input text.
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>>;

    /// Returns a human-readable description of what this matcher looks for.
    ///
    /// Used in logging.
    fn description(&self) -> &str;
}

/// Regex-based matcher that extracts the first capture group.
///
/// Patterns without capture groups yield the whole match.
///
/// # Example
///
/// ```
/// use tempmail_confirm::matcher::{Matcher, RegexMatcher};
///
/// let matcher = RegexMatcher::new(r"code:\s*(\d+)").unwrap();
/// assert_eq!(matcher.find_match("Your code: 42"), Some("42".into()));
/// ```
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
    description: String,
}

impl RegexMatcher {
    /// Creates a new regex matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        Ok(Self {
            description: format!("regex pattern: {pattern}"),
            regex,
        })
    }

    /// Creates a new regex matcher with a custom description.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn with_description(
        pattern: &str,
        description: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        Ok(Self {
            description: description.into(),
            regex,
        })
    }

    /// Returns the number of explicit capture groups in the pattern.
    #[must_use]
    pub fn capture_groups(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Returns the underlying pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Matcher for RegexMatcher {
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| Cow::Borrowed(m.as_str()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Bare-value matcher for the code fallback stage.
///
/// Returns the first occurrence that is not part of a CSS declaration: a
/// candidate directly preceded by `margin`, `padding`, `width` or `height`
/// (optionally followed by `:` or `=`), or directly followed by one of those
/// names, is skipped.
///
/// # Example
///
/// ```
/// use tempmail_confirm::matcher::{FallbackCodeMatcher, Matcher};
///
/// let matcher = FallbackCodeMatcher::default();
/// assert_eq!(matcher.find_match("margin: 1234px"), None);
/// assert_eq!(matcher.find_match("Enter 482913 to continue").as_deref(), Some("482913"));
/// ```
#[derive(Debug, Clone)]
pub struct FallbackCodeMatcher {
    inner: RegexMatcher,
}

impl FallbackCodeMatcher {
    /// Creates a fallback matcher from a bare-value pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            inner: RegexMatcher::with_description(pattern, "fallback code")?,
        })
    }

    fn is_css_value(text: &str, start: usize, end: usize) -> bool {
        CSS_BEFORE.is_match(&text[..start]) || CSS_AFTER.is_match(&text[end..])
    }
}

impl Default for FallbackCodeMatcher {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CODE_PATTERN).expect("valid regex")
    }
}

impl Matcher for FallbackCodeMatcher {
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        self.inner.regex.captures_iter(text).find_map(|caps| {
            let whole = caps.get(0)?;
            if Self::is_css_value(text, whole.start(), whole.end()) {
                return None;
            }
            caps.get(1)
                .or(Some(whole))
                .map(|m| Cow::Borrowed(m.as_str()))
        })
    }

    fn description(&self) -> &str {
        self.inner.description()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_matcher() {
        let matcher = RegexMatcher::new(r"code:\s*(\d+)").unwrap();
        assert_eq!(
            matcher.find_match("Your code: 12345").as_deref(),
            Some("12345")
        );
        assert_eq!(matcher.find_match("No code here"), None);
    }

    #[test]
    fn test_regex_matcher_without_groups_returns_whole_match() {
        let matcher = RegexMatcher::new(r"\d{6}").unwrap();
        assert_eq!(matcher.capture_groups(), 0);
        assert_eq!(matcher.find_match("pin 654321").as_deref(), Some("654321"));
    }

    #[test]
    fn test_regex_matcher_returns_borrowed() {
        let matcher = RegexMatcher::new(r"code:\s*(\d+)").unwrap();
        let result = matcher.find_match("Your code: 12345");
        assert!(matches!(result, Some(Cow::Borrowed(_))));
    }

    #[test]
    fn test_fallback_skips_unit_suffixed_values() {
        let matcher = FallbackCodeMatcher::default();
        assert_eq!(matcher.find_match("margin: 1234px"), None);
        assert_eq!(matcher.find_match("width:600px;height:400px"), None);
    }

    #[test]
    fn test_fallback_skips_css_property_context() {
        let matcher = FallbackCodeMatcher::default();
        assert_eq!(matcher.find_match("padding: 2048"), None);
        assert_eq!(matcher.find_match("height = 1080"), None);
        assert_eq!(matcher.find_match("1920 width"), None);
        assert_eq!(
            matcher.find_match("WIDTH: 1920 then 7731").as_deref(),
            Some("7731")
        );
    }

    #[test]
    fn test_fallback_property_must_be_whole_word() {
        let matcher = FallbackCodeMatcher::default();
        assert_eq!(
            matcher.find_match("Bandwidth 4096 reserved").as_deref(),
            Some("4096")
        );
        assert_eq!(
            matcher.find_match("Your PIN, linewidth: 7731").as_deref(),
            Some("7731")
        );
        assert_eq!(matcher.find_match("max width: 7731"), None);
    }

    #[test]
    fn test_fallback_length_bounds() {
        let matcher = FallbackCodeMatcher::default();
        assert_eq!(matcher.find_match("call 123 now"), None);
        assert_eq!(matcher.find_match("ref 123456789"), None);
        assert_eq!(matcher.find_match("ref 12345678").as_deref(), Some("12345678"));
    }

    #[test]
    fn test_fallback_custom_pattern_keeps_css_guard() {
        let matcher = FallbackCodeMatcher::new(r"\b[A-Z0-9]{6}\b").unwrap();
        assert_eq!(matcher.find_match("margin: ABC123"), None);
        assert_eq!(matcher.find_match("token XYZ789").as_deref(), Some("XYZ789"));
    }
}
