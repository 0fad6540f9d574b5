// Message broker transport between the API process and the worker
//
// One durable direct exchange, durable queues bound by routing key, and
// persistent publishes. Declaration is idempotent and runs at every process
// startup so either side can come up first.

use std::time::Duration;

use async_trait::async_trait;
use lapin::options::{
    BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use thiserror::Error;

pub const APP_EXCHANGE: &str = "app_exchange";

pub const WELCOME_EMAIL_QUEUE: &str = "welcome_emails_queue";
pub const WELCOME_EMAIL_KEY: &str = "user.welcome_email";

pub const REPORTS_QUEUE: &str = "reports_queue";
pub const REPORT_GENERATE_KEY: &str = "report.generate";

/// A publish never blocks the request path longer than this.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// AMQP delivery mode for messages written to disk
const PERSISTENT: u8 = 2;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("publish timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to serialize job payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Seam between services and the broker, so tests can swap in a fake
#[async_trait]
pub trait JobPublisher: Send + Sync {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
    ) -> Result<(), BrokerError>;
}

/// RabbitMQ client shared by publishers; consumers get dedicated channels
pub struct BrokerClient {
    connection: Connection,
    channel: Channel,
}

impl BrokerClient {
    /// Connects and opens the publish channel.
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let connection = Connection::connect(url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        tracing::info!("broker connected and publish channel opened");
        Ok(Self {
            connection,
            channel,
        })
    }

    /// Declares a durable exchange and queue and binds them.
    ///
    /// Idempotent: redeclaring existing resources with the same parameters
    /// succeeds, so this runs on every startup.
    pub async fn declare_and_bind(
        &self,
        exchange: &str,
        queue: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        self.channel
            .exchange_declare(
                exchange,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        self.channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        self.channel
            .queue_bind(
                queue,
                exchange,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        tracing::info!(queue, exchange, routing_key, "queue declared and bound");
        Ok(())
    }

    /// Declares every queue the application uses.
    pub async fn declare_topology(&self) -> Result<(), BrokerError> {
        self.declare_and_bind(APP_EXCHANGE, WELCOME_EMAIL_QUEUE, WELCOME_EMAIL_KEY)
            .await?;
        self.declare_and_bind(APP_EXCHANGE, REPORTS_QUEUE, REPORT_GENERATE_KEY)
            .await
    }

    /// Opens a dedicated channel for one consumer loop.
    ///
    /// AMQP channels are not safe for arbitrary concurrent use, so each loop
    /// owns its own instead of sharing the publish channel.
    pub async fn consumer_channel(&self) -> Result<Channel, BrokerError> {
        Ok(self.connection.create_channel().await?)
    }
}

#[async_trait]
impl JobPublisher for BrokerClient {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
    ) -> Result<(), BrokerError> {
        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_delivery_mode(PERSISTENT);

        let send = async {
            let confirm = self
                .channel
                .basic_publish(
                    exchange,
                    routing_key,
                    BasicPublishOptions::default(),
                    body,
                    properties,
                )
                .await?;
            confirm.await?;
            Ok::<_, BrokerError>(())
        };

        match tokio::time::timeout(PUBLISH_TIMEOUT, send).await {
            Ok(result) => result,
            Err(_) => Err(BrokerError::Timeout(PUBLISH_TIMEOUT)),
        }
    }
}
