//! Error types for the tempmail-confirm crate.
//!
//! All errors implement [`std::error::Error`] and provide context about what went wrong.
//! Errors are categorized by their retryability - see [`Error::is_retryable`].
//!
//! Note that [`TempMailClient::run`](crate::TempMailClient::run) never returns these:
//! it folds every failure into the [`ExtractionResult`](crate::ExtractionResult).
//! They surface only from configuration and from the individual pipeline stages.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while provisioning, polling or fetching.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// A link or code pattern failed to compile.
    #[error("invalid {kind} pattern")]
    InvalidPattern {
        /// Which pattern was rejected (`link` or `code`).
        kind: &'static str,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// The proxy URL could not be used.
    #[error("invalid proxy URL: {proxy}")]
    InvalidProxy {
        /// The proxy URL, with credentials masked.
        proxy: String,
        /// The underlying error, if reqwest rejected it.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// A URL could not be parsed or joined.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Transport errors (RETRYABLE)
    // ─────────────────────────────────────────────────────────────────────────
    /// The request could not be sent or the connection failed.
    #[error("request to {url} failed")]
    Http {
        /// The requested URL.
        url: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than 200.
    #[error("request to {url} failed with status {status}: {body}")]
    HttpStatus {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The first characters of the response body.
        body: String,
    },

    /// The response body was not the expected JSON.
    #[error("failed to decode response from {url}")]
    Decode {
        /// The requested URL.
        url: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Terminal transport / mailbox outcomes (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Every attempt of a request failed.
    #[error("request to {url} failed after {attempts} attempts")]
    RetriesExhausted {
        /// The requested URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// The error of the last attempt.
        #[source]
        last: Box<Error>,
    },

    /// The provisioning call returned no usable mailbox.
    #[error("mailbox provisioning returned no {field}")]
    MailboxUnavailable {
        /// The missing response field.
        field: &'static str,
    },

    /// The provisioned mailbox is not a valid email address.
    #[error("provisioned mailbox is not a valid address: {address}")]
    InvalidMailboxAddress {
        /// The address returned by the service.
        address: String,
    },

    /// No message arrived within the polling budget.
    #[error("no message arrived after {attempts} polling attempts")]
    NoMessage {
        /// Number of polling attempts made.
        attempts: u32,
    },

    /// A listed message could not be fetched.
    #[error("message {id} could not be fetched")]
    MessageUnavailable {
        /// The message identifier.
        id: String,
    },
}

impl Error {
    /// Returns `true` if this error represents a transient failure that might succeed on retry.
    ///
    /// The transport's retry loop only repeats requests that fail with a retryable error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http { .. } | Error::HttpStatus { .. } | Error::Decode { .. } => true,

            Error::InvalidConfig { .. }
            | Error::InvalidPattern { .. }
            | Error::InvalidProxy { .. }
            | Error::InvalidUrl { .. }
            | Error::RetriesExhausted { .. }
            | Error::MailboxUnavailable { .. }
            | Error::InvalidMailboxAddress { .. }
            | Error::NoMessage { .. }
            | Error::MessageUnavailable { .. } => false,
        }
    }

    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidConfig { .. }
            | Error::InvalidPattern { .. }
            | Error::InvalidProxy { .. }
            | Error::InvalidUrl { .. } => ErrorCategory::Configuration,

            Error::Http { source, .. } if source.is_timeout() => ErrorCategory::Timeout,
            Error::Http { .. } => ErrorCategory::Network,
            Error::RetriesExhausted { last, .. } => last.category(),

            Error::HttpStatus { .. }
            | Error::Decode { .. }
            | Error::MailboxUnavailable { .. }
            | Error::InvalidMailboxAddress { .. } => ErrorCategory::Protocol,

            Error::NoMessage { .. } | Error::MessageUnavailable { .. } => ErrorCategory::NotFound,
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or validation errors.
    Configuration,
    /// Network connectivity errors.
    Network,
    /// Timeout errors.
    Timeout,
    /// Unexpected responses from the mailbox API.
    Protocol,
    /// No mailbox content found.
    NotFound,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Timeout => write!(f, "timeout"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::NotFound => write!(f, "not_found"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error() -> Error {
        Error::HttpStatus {
            url: "https://web2.temp-mail.org/messages".into(),
            status: 503,
            body: "unavailable".into(),
        }
    }

    #[test]
    fn test_retryable_classification() {
        // Configuration errors are not retryable
        let err = Error::InvalidConfig {
            message: "bad".into(),
        };
        assert!(!err.is_retryable());

        // Non-200 responses are retryable
        assert!(status_error().is_retryable());

        // Exhausted retries are final
        let err = Error::RetriesExhausted {
            url: "https://web2.temp-mail.org/messages".into(),
            attempts: 3,
            last: Box::new(status_error()),
        };
        assert!(!err.is_retryable());

        let err = Error::NoMessage { attempts: 360 };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_categories() {
        let err = Error::InvalidUrl { url: "::".into() };
        assert_eq!(err.category(), ErrorCategory::Configuration);

        assert_eq!(status_error().category(), ErrorCategory::Protocol);

        let err = Error::RetriesExhausted {
            url: "https://web2.temp-mail.org/mailbox".into(),
            attempts: 3,
            last: Box::new(status_error()),
        };
        assert_eq!(err.category(), ErrorCategory::Protocol);

        let err = Error::NoMessage { attempts: 1 };
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.category().to_string(), "not_found");
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = Error::MessageUnavailable { id: "abc".into() };
        assert_eq!(err.to_string(), "message abc could not be fetched");

        let err = Error::MailboxUnavailable { field: "token" };
        assert_eq!(err.to_string(), "mailbox provisioning returned no token");
    }
}
