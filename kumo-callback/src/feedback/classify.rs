//! Classification of feedback payloads into ignore-or-act decisions.

use serde_json::Value;

use super::address::parse_recipient;
use super::payload::{EnhancedCode, FeedbackFields, FeedbackPayload};
use super::value::{is_blank, stringify};
use super::FeedbackError;

/// Result of classifying a well-formed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Not a permanent failure; nothing to do.
    Ignored(IgnoredFeedback),
    /// Permanent failure; the address should be suppressed.
    Actionable(Actionable),
}

/// Details of an ignored payload, kept for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredFeedback {
    pub class: Option<i64>,
    pub recipient: String,
    pub kind: String,
}

/// A permanent failure ready to hand to the suppression list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actionable {
    /// Normalized bare address.
    pub address: String,
    /// Human-readable reason, e.g.
    /// `551 - MX didn't resolve to any hosts - Enhanced code 5.4.4 from KumoMTA`.
    pub reason: String,
}

/// Classify a decoded payload.
///
/// Only `response.enhanced_code.class == 5` is actionable. The recipient is
/// validated only in that case, so a transient failure with a garbage
/// recipient is still ignored rather than rejected.
pub fn classify(payload: &FeedbackPayload) -> Result<Classification, FeedbackError> {
    let fields = FeedbackFields::decode(payload)?;

    if !fields.enhanced_code.is_permanent() {
        return Ok(Classification::Ignored(IgnoredFeedback {
            class: fields.enhanced_code.class,
            recipient: stringify(fields.recipient),
            kind: stringify(fields.kind),
        }));
    }

    if is_blank(fields.recipient) {
        return Err(FeedbackError::MissingField("recipient"));
    }

    let address = parse_recipient(fields.recipient)?;
    let reason = compose_reason(fields.code, fields.content, &fields.enhanced_code);

    Ok(Classification::Actionable(Actionable { address, reason }))
}

/// Build the reason string from the diagnostic fields.
///
/// Parts are the SMTP code, the response text and the enhanced code,
/// joined with `" - "`. Empty parts (and `"0"`) are dropped.
pub fn compose_reason(
    code: Option<&Value>,
    content: Option<&Value>,
    enhanced_code: &EnhancedCode,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(3);

    parts.extend(code.map(stringify));
    parts.extend(content.map(stringify));
    parts.push(format!("Enhanced code {} from KumoMTA", enhanced_code));

    parts.retain(|part| !part.is_empty() && part != "0");
    parts.join(" - ")
}
