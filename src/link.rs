//! Confirmation link extraction and resolution.

use crate::matcher::{Matcher, RegexMatcher};
use crate::normalize::decode_entities;
use crate::transport::Transport;
use tracing::{debug, info, instrument, warn};

/// Finds the first confirmation link of a message and resolves its redirects.
///
/// The HTML body is scanned first; the plain-text body is consulted only when
/// the HTML body has no candidate. Character references in the captured URL
/// (such as `&amp;` between query parameters) are decoded.
///
/// # Example
///
/// ```
/// use tempmail_confirm::link::LinkExtractor;
///
/// let links = LinkExtractor::default();
/// let html = r#"<a href="https://ex.com/home">Home</a> <a href="https://ex.com/confirm?x=1&amp;y=2">go</a>"#;
/// assert_eq!(links.find_candidate(Some(html), None).as_deref(), Some("https://ex.com/confirm?x=1&y=2"));
/// ```
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    matcher: RegexMatcher,
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new(crate::config::PatternConfig::default().link)
    }
}

impl LinkExtractor {
    /// Creates an extractor from a link matcher whose group 1 captures the URL.
    #[must_use]
    pub fn new(matcher: RegexMatcher) -> Self {
        Self { matcher }
    }

    /// Returns the first candidate link without following it.
    #[must_use]
    pub fn find_candidate(&self, body_html: Option<&str>, body_text: Option<&str>) -> Option<String> {
        [("html", body_html), ("text", body_text)]
            .into_iter()
            .filter_map(|(source, body)| body.filter(|b| !b.is_empty()).map(|b| (source, b)))
            .find_map(|(source, body)| {
                self.matcher.find_match(body).map(|url| {
                    debug!(source, "Found confirmation link candidate");
                    decode_entities(&url).into_owned()
                })
            })
    }

    /// Finds the first candidate link and resolves it to its final destination.
    ///
    /// If following the redirects fails, the unresolved candidate is returned.
    #[instrument(name = "LinkExtractor::extract", skip_all)]
    pub async fn extract(
        &self,
        transport: &dyn Transport,
        body_html: Option<&str>,
        body_text: Option<&str>,
    ) -> Option<String> {
        let Some(candidate) = self.find_candidate(body_html, body_text) else {
            debug!("No confirmation link found in message body");
            return None;
        };

        match transport.resolve_redirects(&candidate).await {
            Ok(resolved) => {
                info!(link = %candidate, resolved = %resolved, "Resolved confirmation link");
                Some(resolved)
            }
            Err(e) => {
                warn!(link = %candidate, error = %e, "Failed to follow redirects, keeping original link");
                Some(candidate)
            }
        }
    }
}
