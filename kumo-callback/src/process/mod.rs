//! Webhook processing pipeline.
//!
//! ```text
//! raw body → parse() → classify() → apply() → Outcome
//! ```
//!
//! Every path ends in an [`Outcome`]; nothing here propagates an error to
//! the transport.

use tracing::{error, info, warn};

use crate::feedback::{
    classify, parse, Actionable, Classification, ErrorKind, FeedbackError, FeedbackPayload,
};
use crate::suppression::{ReasonCode, SuppressionList};

/// Response body for handled callbacks, ignored or applied.
pub const PROCESSED: &str = "KumoMTA Callback processed";

/// Response body when the request body is not a JSON object.
pub const INVALID_JSON: &str = "Invalid JSON";

/// Response body for every other rejection.
pub const BAD_REQUEST: &str = "Bad Request";

/// Terminal state of a webhook invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok(&'static str),
    BadRequest(&'static str),
}

impl Outcome {
    pub fn body(&self) -> &'static str {
        match self {
            Outcome::Ok(body) | Outcome::BadRequest(body) => body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Warning,
    Error,
}

/// How each error kind is logged and answered.
///
/// Validation failures and internal failures get the same 400 on purpose:
/// callers only learn that the callback was refused, the logs carry the
/// distinction.
const REJECTIONS: [(ErrorKind, Severity, Outcome); 4] = [
    (
        ErrorKind::MalformedInput,
        Severity::Warning,
        Outcome::BadRequest(INVALID_JSON),
    ),
    (
        ErrorKind::MissingField,
        Severity::Warning,
        Outcome::BadRequest(BAD_REQUEST),
    ),
    (
        ErrorKind::InvalidAddress,
        Severity::Warning,
        Outcome::BadRequest(BAD_REQUEST),
    ),
    (
        ErrorKind::CollaboratorFailure,
        Severity::Error,
        Outcome::BadRequest(BAD_REQUEST),
    ),
];

fn rejection(kind: ErrorKind) -> (Severity, Outcome) {
    REJECTIONS
        .iter()
        .find(|(k, _, _)| *k == kind)
        .map(|(_, severity, outcome)| (*severity, *outcome))
        .unwrap_or((Severity::Error, Outcome::BadRequest(BAD_REQUEST)))
}

/// Hand an actionable failure to the suppression list.
///
/// Not retried and not deduplicated: calling this twice with the same
/// input records the address twice.
pub async fn apply(
    actionable: &Actionable,
    suppression: &dyn SuppressionList,
) -> Result<(), FeedbackError> {
    suppression
        .record_failure_by_address(
            &actionable.address,
            &actionable.reason,
            ReasonCode::Bounced,
            None,
        )
        .await
        .map_err(FeedbackError::CollaboratorFailure)
}

/// Process one KumoMTA webhook body.
pub async fn handle_webhook(raw: &[u8], suppression: &dyn SuppressionList) -> Outcome {
    let payload = match parse(raw) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(
                error = %e,
                body_preview = %String::from_utf8_lossy(&raw[..raw.len().min(500)]),
                "kumomta_callback_invalid_json"
            );
            return rejection(e.kind()).1;
        }
    };

    match process_payload(&payload, suppression).await {
        Ok(()) => Outcome::Ok(PROCESSED),
        Err(e) => reject(&e, &payload),
    }
}

async fn process_payload(
    payload: &FeedbackPayload,
    suppression: &dyn SuppressionList,
) -> Result<(), FeedbackError> {
    match classify(payload)? {
        Classification::Ignored(ignored) => {
            info!(
                class = ?ignored.class,
                recipient = %ignored.recipient,
                kind = %ignored.kind,
                "kumomta_feedback_ignored"
            );
        }
        Classification::Actionable(actionable) => {
            apply(&actionable, suppression).await?;

            info!(
                recipient = %actionable.address,
                reason = %actionable.reason,
                "kumomta_recipient_suppressed"
            );
        }
    }

    Ok(())
}

fn reject(error: &FeedbackError, payload: &FeedbackPayload) -> Outcome {
    let (severity, outcome) = rejection(error.kind());

    match severity {
        Severity::Warning => warn!(error = %error, payload = %payload, "kumomta_callback_rejected"),
        Severity::Error => error!(error = %error, payload = %payload, "kumomta_callback_failed"),
    }

    outcome
}
