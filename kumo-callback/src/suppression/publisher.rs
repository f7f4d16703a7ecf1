//! Async RabbitMQ publisher for Do-Not-Contact records.
//!
//! The host application consumes the queue and persists each record. The
//! publisher can be shared across request handlers.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions},
    publisher_confirm::Confirmation,
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::types::{ReasonCode, SuppressionRecord};
use super::SuppressionList;

/// Async RabbitMQ publisher with connection management.
///
/// The publisher maintains a persistent connection and channel to RabbitMQ,
/// reconnecting on the next publish after a failure.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    url: String,
    queue: String,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
}

impl Publisher {
    /// Create a new publisher for the given RabbitMQ URL and queue.
    ///
    /// No connection is made until the first publish.
    pub fn new(url: String, queue: String) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                url,
                queue,
                connection: RwLock::new(None),
                channel: RwLock::new(None),
            }),
        }
    }

    pub fn queue(&self) -> &str {
        &self.inner.queue
    }

    /// Ensure we have a valid connection and channel.
    async fn ensure_connected(&self) -> Result<Channel> {
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Double-check after acquiring write lock
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!("rabbitmq_publisher_connecting");

        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        info!("rabbitmq_publisher_connected");

        let ch = conn
            .create_channel()
            .await
            .context("Failed to create channel")?;

        ch.queue_declare(
            &self.inner.queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare suppression queue")?;

        info!(queue = %self.inner.queue, "rabbitmq_queue_declared");

        ch.confirm_select(ConfirmSelectOptions::default())
            .await
            .context("Failed to enable publisher confirms")?;

        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    /// Publish a suppression record and wait for the broker to confirm it.
    pub async fn publish(&self, record: &SuppressionRecord) -> Result<()> {
        let channel = self.ensure_connected().await?;

        let body = serde_json::to_vec(record).context("Failed to serialize suppression record")?;
        let message_id = record.message_id();

        let confirmation = channel
            .basic_publish(
                "",
                &self.inner.queue,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into())
                    .with_message_id(message_id.clone().into()),
            )
            .await
            .context("Failed to publish to suppression queue")?
            .await
            .context("Failed to confirm publish")?;

        check_confirmation(confirmation)?;

        info!(
            queue = %self.inner.queue,
            message_id = %message_id,
            body_length = body.len(),
            "rabbitmq_suppression_published"
        );

        Ok(())
    }

    /// Close the connection gracefully.
    pub async fn close(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_connection_close_error");
            }
        }

        info!("rabbitmq_publisher_closed");
    }
}

/// Only a plain ack means the broker took ownership of the record.
fn check_confirmation(confirmation: Confirmation) -> Result<()> {
    match confirmation {
        Confirmation::Ack(None) => Ok(()),
        Confirmation::Ack(Some(_)) => bail!("Suppression record was returned by the broker"),
        Confirmation::Nack(_) => bail!("Broker rejected suppression record"),
        Confirmation::NotRequested => bail!("Publisher confirms are not enabled on the channel"),
    }
}

#[async_trait]
impl SuppressionList for Publisher {
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

        self.publish(&record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_creation() {
        let publisher = Publisher::new(
            "amqp://localhost:5672".to_string(),
            "do_not_contact".to_string(),
        );

        assert_eq!(publisher.queue(), "do_not_contact");
        assert!(Arc::strong_count(&publisher.inner) == 1);
    }

    #[test]
    fn test_check_confirmation() {
        assert!(check_confirmation(Confirmation::Ack(None)).is_ok());

        let err = check_confirmation(Confirmation::Nack(None)).unwrap_err();
        assert!(err.to_string().contains("rejected"));

        let err = check_confirmation(Confirmation::NotRequested).unwrap_err();
        assert!(err.to_string().contains("not enabled"));
    }

    #[tokio::test]
    async fn test_publish_without_broker_fails() {
        // port 1 is never an AMQP broker
        let publisher = Publisher::new(
            "amqp://127.0.0.1:1/%2f".to_string(),
            "do_not_contact".to_string(),
        );
        let record =
            SuppressionRecord::new("user@example.com", "reason", ReasonCode::Bounced, None);

        let err = publisher.publish(&record).await.unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to connect to RabbitMQ"));
    }
}
