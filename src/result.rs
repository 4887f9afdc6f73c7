//! The terminal record of a run.

use serde::Serialize;

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// A confirmation link or code was found.
    Success,
    /// Nothing was found, or an earlier stage failed.
    Failed,
}

/// What a run produced.
///
/// `status` is [`Status::Success`] exactly when a link or a code is present;
/// the constructors are the only way to build one.
///
/// # Example
///
/// ```
/// use tempmail_confirm::{ExtractionResult, Status};
///
/// let result = ExtractionResult::from_artifacts(Some("a@b.io".into()), None, Some("4821".into()));
/// assert_eq!(result.status(), Status::Success);
///
/// let json = serde_json::to_value(&result).unwrap();
/// assert_eq!(json["confirmation_code"], "4821");
/// assert!(json["confirmation_link"].is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    status: Status,
    email: Option<String>,
    confirmation_link: Option<String>,
    confirmation_code: Option<String>,
}

impl ExtractionResult {
    /// A failed run that got as far as provisioning `email` (if any).
    #[must_use]
    pub fn failed(email: Option<String>) -> Self {
        Self {
            status: Status::Failed,
            email,
            confirmation_link: None,
            confirmation_code: None,
        }
    }

    /// A run that reached extraction; succeeds if either artifact is present.
    #[must_use]
    pub fn from_artifacts(
        email: Option<String>,
        confirmation_link: Option<String>,
        confirmation_code: Option<String>,
    ) -> Self {
        let status = if confirmation_link.is_some() || confirmation_code.is_some() {
            Status::Success
        } else {
            Status::Failed
        };
        Self {
            status,
            email,
            confirmation_link,
            confirmation_code,
        }
    }

    /// Returns the run status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns `true` for [`Status::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Returns the provisioned mailbox address.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the resolved confirmation link.
    #[must_use]
    pub fn confirmation_link(&self) -> Option<&str> {
        self.confirmation_link.as_deref()
    }

    /// Returns the confirmation code.
    #[must_use]
    pub fn confirmation_code(&self) -> Option<&str> {
        self.confirmation_code.as_deref()
    }

    /// Serializes the record as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
