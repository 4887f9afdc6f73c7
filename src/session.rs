//! Mailbox API calls and the data they produce.
//!
//! This module wraps the three endpoints of the mailbox service with proper
//! error handling:
//!
//! - `POST /mailbox` provisions a [`MailboxSession`]
//! - `GET /messages` lists [`MessageSummary`] entries
//! - `GET /messages/{id}` fetches a full [`Message`]

use crate::config::Config;
use crate::error::{Error, Result};
use crate::transport::Transport;
use email_address::EmailAddress;
use reqwest::{Method, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// A provisioned disposable inbox and its access token.
///
/// The token is kept in a [`SecretString`] and redacted from `Debug` output.
#[derive(Clone)]
pub struct MailboxSession {
    address: String,
    token: SecretString,
}

impl MailboxSession {
    /// Creates a session from an address and access token.
    #[must_use]
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: SecretString::from(token.into()),
        }
    }

    /// Returns the mailbox address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the bearer token for mailbox requests.
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl std::fmt::Debug for MailboxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxSession")
            .field("address", &self.address)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// An entry of the message listing.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageSummary {
    /// Message identifier, when the service provided one.
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    /// Sender, if listed.
    #[serde(default)]
    pub from: Option<String>,
    /// Subject line, if listed.
    #[serde(default)]
    pub subject: Option<String>,
}

/// A fetched message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    /// Message identifier.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Sender, if provided.
    #[serde(default)]
    pub from: Option<String>,
    /// Subject line, if provided.
    #[serde(default)]
    pub subject: Option<String>,
    /// HTML body; empty when the message has none.
    #[serde(rename = "bodyHtml", default, deserialize_with = "null_as_empty")]
    pub body_html: String,
    /// Plain-text body; empty when the message has none.
    #[serde(rename = "bodyText", default, deserialize_with = "null_as_empty")]
    pub body_text: String,
}

#[derive(Debug, Deserialize)]
struct CreatedMailbox {
    #[serde(default)]
    mailbox: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default, deserialize_with = "null_as_empty")]
    messages: Vec<MessageSummary>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn decode<T: DeserializeOwned>(url: &Url, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|source| Error::Decode {
        url: url.to_string(),
        source,
    })
}

/// Provisions a new mailbox.
///
/// # Errors
///
/// Returns an error if the request fails, a field is missing, or the address
/// is not a valid email address.
#[instrument(name = "session::create_mailbox", skip_all)]
pub async fn create_mailbox(transport: &dyn Transport, config: &Config) -> Result<MailboxSession> {
    let url = config.endpoint("/mailbox")?;
    let value = transport.request_json(Method::POST, &url, None).await?;
    let created: CreatedMailbox = decode(&url, value)?;

    let address = created
        .mailbox
        .filter(|mailbox| !mailbox.is_empty())
        .ok_or(Error::MailboxUnavailable { field: "mailbox" })?;
    let token = created
        .token
        .filter(|token| !token.is_empty())
        .ok_or(Error::MailboxUnavailable { field: "token" })?;

    if !EmailAddress::is_valid(&address) {
        return Err(Error::InvalidMailboxAddress { address });
    }

    info!(email = %address, "Created mailbox");
    Ok(MailboxSession::new(address, token))
}

/// Lists the messages currently in the mailbox, in arrival order.
///
/// # Errors
///
/// Returns an error if the request fails or the listing cannot be decoded.
#[instrument(name = "session::list_messages", skip_all, fields(email = %session.address()))]
pub async fn list_messages(
    transport: &dyn Transport,
    config: &Config,
    session: &MailboxSession,
) -> Result<Vec<MessageSummary>> {
    let url = config.endpoint("/messages")?;
    let value = transport
        .request_json(Method::GET, &url, Some(session.access_token()))
        .await?;
    let list: MessageList = decode(&url, value)?;

    debug!(message_count = list.messages.len(), "Listed messages");
    Ok(list.messages)
}

/// Fetches one message by identifier.
///
/// # Errors
///
/// Returns [`Error::MessageUnavailable`] if the message cannot be fetched or decoded.
#[instrument(name = "session::fetch_message", skip(transport, config, session))]
pub async fn fetch_message(
    transport: &dyn Transport,
    config: &Config,
    session: &MailboxSession,
    message_id: &str,
) -> Result<Message> {
    let unavailable = || Error::MessageUnavailable {
        id: message_id.to_string(),
    };

    // The id is one path segment; pushing percent-encodes `/`, `?` and `#`
    let mut url = config.endpoint("/messages")?;
    url.path_segments_mut()
        .map_err(|()| unavailable())?
        .pop_if_empty()
        .push(message_id);

    let value = transport
        .request_json(Method::GET, &url, Some(session.access_token()))
        .await
        .map_err(|e| {
            debug!(error = %e, "Message request failed");
            unavailable()
        })?;

    let mut message: Message = decode(&url, value).map_err(|e| {
        debug!(error = %e, "Message body could not be decoded");
        unavailable()
    })?;
    if message.id.is_empty() {
        message.id = message_id.to_string();
    }

    debug!(
        subject = message.subject.as_deref().unwrap_or_default(),
        html_len = message.body_html.len(),
        text_len = message.body_text.len(),
        "Fetched message"
    );
    Ok(message)
}
