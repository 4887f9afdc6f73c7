//! Disposable-mailbox client running the confirmation pipeline.
//!
//! The [`TempMailClient`] is the main entry point for this crate. It provides
//! async methods to:
//!
//! - Provision a mailbox
//! - Wait for the first message
//! - Fetch it and extract a confirmation link and code
//!
//! [`run`](TempMailClient::run) chains all of them and always returns an
//! [`ExtractionResult`], never an error.
//!
//! # Example
//!
//! ```no_run
//! use tempmail_confirm::{Config, TempMailClient};
//!
//! # async fn example() -> tempmail_confirm::Result<()> {
//! let client = TempMailClient::new(Config::from_env()?)?;
//! let result = client.run().await;
//!
//! if let Some(code) = result.confirmation_code() {
//!     println!("Got code: {code}");
//! }
//! # Ok(())
//! # }
//! ```

use crate::code::CodeExtractor;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::link::LinkExtractor;
use crate::poller::{self, PollOutcome};
use crate::result::ExtractionResult;
use crate::session::{self, MailboxSession, Message};
use crate::transport::{HttpTransport, Transport};
use tracing::{error, info, instrument, warn};

/// Async client for one disposable-mailbox confirmation run.
///
/// Create using [`TempMailClient::new`], or [`with_transport`](Self::with_transport)
/// to supply a custom [`Transport`].
///
/// # Lifecycle
///
/// 1. [`create_mailbox`](Self::create_mailbox) provisions an inbox
/// 2. [`wait_for_message`](Self::wait_for_message) polls until a message is listed
/// 3. [`fetch_message`](Self::fetch_message) downloads it
/// 4. [`extract`](Self::extract) finds the link and code
///
/// or simply [`run`](Self::run) them all.
pub struct TempMailClient<T = HttpTransport> {
    transport: T,
    config: Config,
    links: LinkExtractor,
    codes: CodeExtractor,
}

impl TempMailClient<HttpTransport> {
    /// Creates a client backed by [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (for example an
    /// unusable proxy).
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> TempMailClient<T> {
    /// Creates a client over the given transport.
    #[must_use]
    pub fn with_transport(config: Config, transport: T) -> Self {
        let links = LinkExtractor::new(config.patterns.link.clone());
        let codes = CodeExtractor::new(config.patterns.code_fallback.clone());
        Self {
            transport,
            config,
            links,
            codes,
        }
    }

    /// Returns the configuration of this client.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the whole pipeline: provision, poll, fetch, extract.
    ///
    /// Failures are reported in the returned record: if provisioning, polling
    /// or fetching fails, extraction is skipped and the record is
    /// [`Failed`](crate::Status::Failed) with whatever was known by then.
    #[instrument(
        name = "TempMailClient::run",
        skip(self),
        fields(base_url = %self.config.base_url, proxy_enabled = self.config.proxy.is_some())
    )]
    pub async fn run(&self) -> ExtractionResult {
        let session = match self.create_mailbox().await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, category = %e.category(), "Failed to create temporary mailbox");
                return ExtractionResult::failed(None);
            }
        };
        let email = Some(session.address().to_string());

        let message_id = match self.wait_for_message(&session).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "No message to extract from");
                return ExtractionResult::failed(email);
            }
        };

        let message = match self.fetch_message(&session, &message_id).await {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "Failed to fetch message details");
                return ExtractionResult::failed(email);
            }
        };

        let (link, code) = self.extract(&message).await;
        let result = ExtractionResult::from_artifacts(email, link, code);

        info!(status = ?result.status(), "Run finished");
        result
    }

    /// Provisions a new mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the service does not hand out a usable mailbox.
    pub async fn create_mailbox(&self) -> Result<MailboxSession> {
        session::create_mailbox(&self.transport, &self.config).await
    }

    /// Polls until the first message is listed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMessage`] when the polling budget is spent.
    pub async fn wait_for_message(&self, session: &MailboxSession) -> Result<String> {
        match poller::poll_for_message(&self.transport, &self.config, session, &self.config.polling)
            .await
        {
            PollOutcome::Found { message_id, .. } => Ok(message_id),
            PollOutcome::NotFound { attempts } => Err(Error::NoMessage { attempts }),
        }
    }

    /// Fetches one message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageUnavailable`] if the message cannot be fetched.
    pub async fn fetch_message(&self, session: &MailboxSession, message_id: &str) -> Result<Message> {
        session::fetch_message(&self.transport, &self.config, session, message_id).await
    }

    /// Extracts the confirmation link (resolved) and code from a message.
    #[instrument(name = "TempMailClient::extract", skip_all, fields(message_id = %message.id))]
    pub async fn extract(&self, message: &Message) -> (Option<String>, Option<String>) {
        let html = Some(message.body_html.as_str());
        let text = Some(message.body_text.as_str());

        let link = self.links.extract(&self.transport, html, text).await;
        let code = self.codes.extract(html, text);

        match &code {
            Some(code) => info!(code = %code, "Extracted confirmation code"),
            None => warn!("No confirmation code found in email body"),
        }

        (link, code)
    }
}

impl<T> std::fmt::Debug for TempMailClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempMailClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("proxy", &self.config.proxy.as_ref().map(ToString::to_string))
            .field("polling", &self.config.polling)
            .finish_non_exhaustive()
    }
}
