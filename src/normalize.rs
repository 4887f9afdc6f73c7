//! HTML body normalization.
//!
//! Turns a raw HTML message body into a single line of searchable text:
//! stylesheets and inline styles are dropped, tags become spaces, entities
//! are decoded and whitespace is collapsed.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));

static STYLE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s*style="[^"]*""#).expect("valid regex"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("valid regex")
});

/// Converts an HTML body into clean, single-spaced plain text.
///
/// Empty input yields an empty string; this never fails.
///
/// # Example
///
/// ```
/// use tempmail_confirm::normalize::normalize_html;
///
/// let html = r#"<style>p { margin: 1234px }</style><p style="color:red">Code:&nbsp;<b>4821</b></p>"#;
/// assert_eq!(normalize_html(html), "Code: 4821");
/// ```
#[must_use]
pub fn normalize_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let text = STYLE_BLOCK.replace_all(html, "");
    let text = STYLE_ATTR.replace_all(&text, "");
    let text = TAG.replace_all(&text, " ");
    let text = decode_entities(&text);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decodes named and numeric HTML character references.
///
/// Unknown names and invalid code points are left as written.
///
/// # Example
///
/// ```
/// use tempmail_confirm::normalize::decode_entities;
///
/// assert_eq!(decode_entities("a &amp; b &#8212; &#x41;"), "a & b \u{2014} A");
/// assert_eq!(decode_entities("&bogus;"), "&bogus;");
/// ```
#[must_use]
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    ENTITY.replace_all(text, |caps: &Captures<'_>| {
        let reference = &caps[1];
        let decoded = match reference.strip_prefix('#') {
            Some(numeric) => decode_numeric(numeric),
            None => named_entity(reference),
        };
        decoded.map_or_else(|| caps[0].to_string(), String::from)
    })
}

fn decode_numeric(reference: &str) -> Option<char> {
    let code = match reference.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => reference.parse().ok()?,
    };
    match code {
        0 => Some('\u{FFFD}'),
        code => char::from_u32(code),
    }
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" | "AMP" => '&',
        "lt" | "LT" => '<',
        "gt" | "GT" => '>',
        "quot" | "QUOT" => '"',
        "apos" => '\'',
        "nbsp" => '\u{A0}',
        "ensp" => '\u{2002}',
        "emsp" => '\u{2003}',
        "thinsp" => '\u{2009}',
        "zwnj" => '\u{200C}',
        "zwj" => '\u{200D}',
        "shy" => '\u{AD}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "sbquo" => '\u{201A}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "bdquo" => '\u{201E}',
        "laquo" => '\u{AB}',
        "raquo" => '\u{BB}',
        "hellip" => '\u{2026}',
        "middot" => '\u{B7}',
        "bull" => '\u{2022}',
        "copy" => '\u{A9}',
        "reg" => '\u{AE}',
        "trade" => '\u{2122}',
        "euro" => '\u{20AC}',
        "pound" => '\u{A3}',
        "yen" => '\u{A5}',
        "cent" => '\u{A2}',
        "sect" => '\u{A7}',
        "deg" => '\u{B0}',
        "times" => '\u{D7}',
        "divide" => '\u{F7}',
        "larr" => '\u{2190}',
        "rarr" => '\u{2192}',
        _ => return None,
    };
    Some(c)
}
