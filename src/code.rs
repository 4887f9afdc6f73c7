//! Confirmation code extraction.
//!
//! Codes are located by an ordered chain of [`PatternRule`]s. Context rules
//! require a trigger phrase (English or Russian) in front of the value and are
//! tried first, trigger class by trigger class, each in
//! [`ValueShape::Numeric`], [`ValueShape::Alphanumeric`],
//! [`ValueShape::Hyphenated`] order. The first rule that matches wins, even if
//! a later rule would match earlier in the text. Only when no context rule
//! matches does the bare [`FallbackCodeMatcher`] get a turn.
//!
//! # Example
//!
//! ```
//! use tempmail_confirm::code::CodeExtractor;
//!
//! let extractor = CodeExtractor::default();
//! let code = extractor.extract(Some("<p>Your confirmation code: <b>123456</b></p>"), None);
//! assert_eq!(code.as_deref(), Some("123456"));
//! ```

use crate::matcher::{FallbackCodeMatcher, Matcher};
use crate::normalize::normalize_html;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::{debug, instrument};

/// Trigger phrase classes, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Explicit labels such as `confirmation code` or `код подтверждения`.
    Labeled,
    /// A bare `code` / `код`.
    Bare,
    /// Sentences such as `your code is` or `use this code`.
    Sentence,
}

impl Trigger {
    /// All trigger classes in the order they are tried.
    pub const ALL: [Trigger; 3] = [Trigger::Labeled, Trigger::Bare, Trigger::Sentence];

    fn pattern(self) -> &'static str {
        match self {
            Trigger::Labeled => {
                "код подтверждения|confirmation code|verify code|verification code|auth code\
                 |authentication code|your code|код верификации|код для подтверждения|код активации"
            }
            Trigger::Bare => "code|код",
            Trigger::Sentence => r"your\s*code\s*is|here\s*is\s*your\s*code|use\s*this\s*code",
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Labeled => write!(f, "labeled"),
            Trigger::Bare => write!(f, "bare"),
            Trigger::Sentence => write!(f, "sentence"),
        }
    }
}

/// Shapes a captured code may take, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    /// 4 to 8 digits.
    Numeric,
    /// 6 to 12 letters or digits.
    Alphanumeric,
    /// 6 to 16 letters, digits or hyphens.
    Hyphenated,
}

impl ValueShape {
    /// All shapes in the order they are tried.
    pub const ALL: [ValueShape; 3] = [
        ValueShape::Numeric,
        ValueShape::Alphanumeric,
        ValueShape::Hyphenated,
    ];

    fn pattern(self) -> &'static str {
        match self {
            ValueShape::Numeric => r"\b\d{4,8}\b",
            ValueShape::Alphanumeric => r"[A-Za-z0-9]{6,12}\b",
            ValueShape::Hyphenated => r"[A-Za-z0-9\-]{6,16}\b",
        }
    }
}

impl std::fmt::Display for ValueShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueShape::Numeric => write!(f, "numeric"),
            ValueShape::Alphanumeric => write!(f, "alphanumeric"),
            ValueShape::Hyphenated => write!(f, "hyphenated"),
        }
    }
}

/// One link of the extraction chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternRule {
    /// A trigger phrase, an optional `:`/`-` separator, then a value of the given shape.
    Context {
        /// Trigger phrase class.
        trigger: Trigger,
        /// Expected value shape.
        shape: ValueShape,
    },
    /// The bare-value pattern, consulted last.
    Fallback,
}

impl std::fmt::Display for PatternRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternRule::Context { trigger, shape } => write!(f, "{trigger} {shape}"),
            PatternRule::Fallback => write!(f, "fallback"),
        }
    }
}

struct ContextRule {
    rule: PatternRule,
    regex: Regex,
}

static CONTEXT_RULES: LazyLock<Vec<ContextRule>> = LazyLock::new(|| {
    Trigger::ALL
        .into_iter()
        .flat_map(|trigger| ValueShape::ALL.into_iter().map(move |shape| (trigger, shape)))
        .map(|(trigger, shape)| ContextRule {
            rule: PatternRule::Context { trigger, shape },
            regex: Regex::new(&format!(
                r"(?i)(?:{})\s*[:\-]?\s*({})",
                trigger.pattern(),
                shape.pattern()
            ))
            .expect("valid regex"),
        })
        .collect()
});

/// A located code together with the rule that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMatch<'a> {
    /// The captured code.
    pub value: Cow<'a, str>,
    /// The rule that produced it.
    pub rule: PatternRule,
}

/// Finds confirmation codes in message bodies.
#[derive(Debug, Clone, Default)]
pub struct CodeExtractor {
    fallback: FallbackCodeMatcher,
}

impl CodeExtractor {
    /// Creates an extractor that uses `fallback` as its last rule.
    #[must_use]
    pub fn new(fallback: FallbackCodeMatcher) -> Self {
        Self { fallback }
    }

    /// Returns the chain in evaluation order.
    #[must_use]
    pub fn rules() -> Vec<PatternRule> {
        CONTEXT_RULES
            .iter()
            .map(|context| context.rule)
            .chain(std::iter::once(PatternRule::Fallback))
            .collect()
    }

    /// Runs the chain over one piece of text.
    #[must_use]
    pub fn find_in<'a>(&self, text: &'a str) -> Option<CodeMatch<'a>> {
        let context = CONTEXT_RULES.iter().find_map(|context| {
            context
                .regex
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| CodeMatch {
                    value: Cow::Borrowed(m.as_str()),
                    rule: context.rule,
                })
        });

        context.or_else(|| {
            self.fallback.find_match(text).map(|value| CodeMatch {
                value,
                rule: PatternRule::Fallback,
            })
        })
    }

    /// Extracts a code from a message.
    ///
    /// The normalized HTML body is searched first; the plain-text body is
    /// searched only when the HTML body is empty or yields nothing.
    #[instrument(
        name = "CodeExtractor::extract",
        skip_all,
        fields(
            html_len = body_html.map_or(0, str::len),
            text_len = body_text.map_or(0, str::len)
        )
    )]
    pub fn extract(&self, body_html: Option<&str>, body_text: Option<&str>) -> Option<String> {
        let clean = normalize_html(body_html.unwrap_or_default());

        if !clean.is_empty() {
            if let Some(found) = self.find_in(&clean) {
                debug!(rule = %found.rule, source = "html", "Found confirmation code");
                return Some(found.value.into_owned());
            }
        }

        if let Some(text) = body_text.filter(|text| !text.is_empty()) {
            if let Some(found) = self.find_in(text) {
                debug!(rule = %found.rule, source = "text", "Found confirmation code");
                return Some(found.value.into_owned());
            }
        }

        debug!("No confirmation code found in message body");
        None
    }
}

impl Matcher for CodeExtractor {
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        self.find_in(text).map(|found| found.value)
    }

    fn description(&self) -> &str {
        "confirmation code"
    }
}
