//! In-memory suppression list.
//!
//! Useful when embedding the classifier in another service and in tests.
//! Every call is recorded, duplicates included.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::types::{ReasonCode, SuppressionRecord};
use super::SuppressionList;

#[derive(Debug, Clone, Default)]
pub struct MemorySuppressionList {
    records: Arc<Mutex<Vec<SuppressionRecord>>>,
}

impl MemorySuppressionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls, in call order.
    pub async fn records(&self) -> Vec<SuppressionRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl SuppressionList for MemorySuppressionList {
    async fn record_failure_by_address(
        &self,
        address: &str,
        reason: &str,
        reason_code: ReasonCode,
        source_message_id: Option<&str>,
    ) -> Result<()> {
        let record = SuppressionRecord::new(
            address,
            reason,
            reason_code,
            source_message_id.map(str::to_string),
        );

        let mut records = self.records.lock().await;
        records.push(record);

        debug!(address = %address, total = records.len(), "memory_suppression_recorded");

        Ok(())
    }
}
