//! Suppression-list collaborators.
//!
//! The host application owns the Do-Not-Contact list. This module defines
//! the capability the webhook needs from it and two implementations:
//! - [`Publisher`]: hands records to the host over RabbitMQ
//! - [`MemorySuppressionList`]: keeps records in memory
//!
//! Implementations must tolerate the same address being recorded more than
//! once; KumoMTA may deliver a webhook twice and nothing here deduplicates.

pub mod memory;
pub mod publisher;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemorySuppressionList;
pub use publisher::Publisher;
pub use types::{ReasonCode, SuppressionRecord, SUPPRESSION_QUEUE};

/// Host capability to mark an address as Do Not Contact.
#[async_trait]
pub trait SuppressionList: Send + Sync {
    /// Create or update the Do-Not-Contact entry for `address`.
    async fn record_failure_by_address(
        &self,
        address: &str,
        reason: &str,
        reason_code: ReasonCode,
        source_message_id: Option<&str>,
    ) -> Result<()>;
}
