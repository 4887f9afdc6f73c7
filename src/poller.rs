//! Waiting for the first message to arrive.

use crate::config::{Config, PollingConfig};
use crate::session::{self, MailboxSession};
use crate::transport::Transport;
use tracing::{debug, error, info, instrument, warn};

/// Outcome of polling a mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The identifier of the first listed message.
    Found {
        /// Message identifier.
        message_id: String,
        /// One-based attempt on which it was seen.
        attempt: u32,
    },
    /// The budget was spent without seeing a message.
    NotFound {
        /// Number of listing queries made.
        attempts: u32,
    },
}

/// Polls the mailbox until a message is listed or the budget runs out.
///
/// Each attempt issues one listing query. A non-empty listing returns the
/// first message immediately; otherwise the poller sleeps for
/// [`PollingConfig::interval`] (also after the final attempt). A listing that
/// fails after the transport's own retries counts as an empty round.
#[instrument(
    name = "poller::poll_for_message",
    skip_all,
    fields(
        email = %session.address(),
        max_attempts = polling.max_attempts,
        interval_secs = polling.interval.as_secs()
    )
)]
pub async fn poll_for_message(
    transport: &dyn Transport,
    config: &Config,
    session: &MailboxSession,
    polling: &PollingConfig,
) -> PollOutcome {
    for attempt in 1..=polling.max_attempts {
        match session::list_messages(transport, config, session).await {
            Ok(messages) => match messages.into_iter().next() {
                Some(first) => {
                    if let Some(message_id) = first.id {
                        info!(
                            attempt,
                            message_id = %message_id,
                            subject = first.subject.as_deref().unwrap_or_default(),
                            "Message arrived"
                        );
                        return PollOutcome::Found {
                            message_id,
                            attempt,
                        };
                    }
                    warn!(attempt, "First listed message has no identifier");
                }
                None => debug!(attempt, "Mailbox is empty"),
            },
            Err(e) => warn!(attempt, error = %e, "Listing messages failed"),
        }

        tokio::time::sleep(polling.interval).await;
    }

    error!(attempts = polling.max_attempts, "No messages found after polling");
    PollOutcome::NotFound {
        attempts: polling.max_attempts,
    }
}
