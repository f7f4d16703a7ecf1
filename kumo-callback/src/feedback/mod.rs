//! KumoMTA feedback-loop payload handling.
//!
//! This module turns a raw webhook body into a classification:
//!
//! ```text
//! raw body → parse() → FeedbackPayload → classify() → Classification
//! ```
//!
//! Only permanent failures (enhanced status class 5) are actionable.
//! Everything else is ignored without being treated as an error.

pub mod address;
pub mod classify;
pub mod payload;
pub mod value;

use thiserror::Error;

pub use address::{parse_recipient, AddressError};
pub use classify::{classify, compose_reason, Actionable, Classification, IgnoredFeedback};
pub use payload::{parse, EnhancedCode, FeedbackFields, FeedbackPayload};

/// Errors produced while handling a feedback webhook.
#[derive(Debug, Error)]
pub enum FeedbackError {
    /// Body is not JSON, or not a JSON object at the top level.
    #[error("malformed KumoMTA payload: {0}")]
    MalformedInput(String),

    /// A required field is absent (or null, or an empty recipient).
    #[error("missing required KumoMTA field: {0}")]
    MissingField(&'static str),

    /// The recipient is not a single syntactically valid address.
    #[error("invalid recipient address in KumoMTA payload: {0}")]
    InvalidAddress(#[from] AddressError),

    /// The suppression list refused or failed to record the address.
    #[error("suppression list update failed: {0:#}")]
    CollaboratorFailure(anyhow::Error),
}

/// Discriminant of [`FeedbackError`], used for boundary lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    MissingField,
    InvalidAddress,
    CollaboratorFailure,
}

impl FeedbackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedbackError::MalformedInput(_) => ErrorKind::MalformedInput,
            FeedbackError::MissingField(_) => ErrorKind::MissingField,
            FeedbackError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            FeedbackError::CollaboratorFailure(_) => ErrorKind::CollaboratorFailure,
        }
    }

    /// Whether the error was caused by the payload rather than by us.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MissingField | ErrorKind::InvalidAddress
        )
    }
}
