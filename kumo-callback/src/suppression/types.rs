//! Suppression record types handed to the host application.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Queue name for Do-Not-Contact records consumed by the host.
pub const SUPPRESSION_QUEUE: &str = "do_not_contact";

/// Why an address was suppressed.
///
/// Values match the host's Do-Not-Contact reason constants and are
/// serialized as the bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ReasonCode {
    Unsubscribed = 1,
    Bounced = 2,
    Manual = 3,
}

impl From<ReasonCode> for u8 {
    fn from(code: ReasonCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for ReasonCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ReasonCode::Unsubscribed),
            2 => Ok(ReasonCode::Bounced),
            3 => Ok(ReasonCode::Manual),
            other => Err(format!("unknown Do-Not-Contact reason code {}", other)),
        }
    }
}

/// A request to mark an address as Do Not Contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionRecord {
    /// Email address to suppress
    pub address: String,
    /// Human-readable reason shown in the host
    pub reason: String,
    /// Host reason constant
    pub reason_code: ReasonCode,
    /// Host email id the failure relates to, when known
    pub source_message_id: Option<String>,
}

impl SuppressionRecord {
    pub fn new(
        address: impl Into<String>,
        reason: impl Into<String>,
        reason_code: ReasonCode,
        source_message_id: Option<String>,
    ) -> Self {
        Self {
            address: address.into(),
            reason: reason.into(),
            reason_code,
            source_message_id,
        }
    }

    /// Stable id for the record, so consumers can drop duplicate deliveries.
    pub fn message_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}\n{}", self.address, self.reason).as_bytes());
        hex::encode(hasher.finalize())
    }
}
