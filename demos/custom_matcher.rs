//! Example: Custom link and code patterns.
//!
//! This example demonstrates how to:
//! - Try matchers locally on a body you already have
//! - Override the link pattern and the fallback code pattern for a real run
//!
//! # Usage
//!
//! ```bash
//! cargo run --example custom_matcher
//! ```

use tempmail_confirm::code::CodeExtractor;
use tempmail_confirm::link::LinkExtractor;
use tempmail_confirm::matcher::{FallbackCodeMatcher, Matcher, RegexMatcher};
use tempmail_confirm::{Config, TempMailClient};

/// Links to an `/activate/` page, whatever their query string
const ACTIVATION_LINK: &str = r#"href="(https://[^"]*/activate/[^"]*)""#;

/// Order-style references such as `ORD-48213`
const ORDER_CODE: &str = r"\b(ORD-\d{5,})\b";

const SAMPLE_HTML: &str = r#"
<html>
  <head><style>td { padding: 2048px; }</style></head>
  <body>
    <a href="https://shop.test/unsubscribe?u=1">Unsubscribe</a>
    <a href="https://shop.test/activate/7f3a">Activate your account</a>
    <p>Reference ORD-48213</p>
  </body>
</html>
"#;

#[tokio::main]
async fn main() -> tempmail_confirm::Result<()> {
    println!("1. Matching locally against a sample body...");

    let links = LinkExtractor::new(
        RegexMatcher::with_description(ACTIVATION_LINK, "Activation link").expect("valid regex"),
    );
    match links.find_candidate(Some(SAMPLE_HTML), None) {
        Some(link) => println!("   Link: {}", link),
        None => println!("   Link: not found"),
    }

    let codes = CodeExtractor::new(FallbackCodeMatcher::new(ORDER_CODE).expect("valid regex"));
    match codes.extract(Some(SAMPLE_HTML), None) {
        Some(code) => println!("   Code ({}): {}", codes.description(), code),
        None => println!("   Code: not found"),
    }

    println!("\n2. Running against a fresh mailbox with the same patterns...");

    let config = Config::builder()
        .link_pattern(ACTIVATION_LINK)
        .code_pattern(ORDER_CODE)
        .max_attempts(24) // Two minutes
        .build()?;

    let client = TempMailClient::new(config)?;
    let session = client.create_mailbox().await?;
    println!("   Sign up with: {}", session.address());

    let id = client.wait_for_message(&session).await?;
    let message = client.fetch_message(&session, &id).await?;
    let (link, code) = client.extract(&message).await;

    println!("   Link: {}", link.as_deref().unwrap_or("not found"));
    println!("   Code: {}", code.as_deref().unwrap_or("not found"));

    println!("\nDone!");
    Ok(())
}
