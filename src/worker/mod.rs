// Background job consumer
//
// One intake loop per queue, each on its own AMQP channel, dispatching to a
// domain service and converting the outcome into ack/nack/reject. Explicit
// acknowledgment only; a failed handler is nacked without requeue (accepted
// at-most-one-attempt semantics), a message that cannot even be deserialized
// is rejected outright as poison.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicRejectOptions,
};
use lapin::types::FieldTable;
use lapin::Channel;

use crate::domain::jobs::{GenerateReportJob, WelcomeEmailJob};
use crate::queue::{BrokerClient, BrokerError, REPORTS_QUEUE, WELCOME_EMAIL_QUEUE};
use crate::services::{ReportService, UserService};

/// Bound for welcome-email handling
const EMAIL_TIMEOUT: Duration = Duration::from_secs(5);
/// Reports aggregate over domain data and get a longer leash
const REPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// What the consume loop should tell the broker about a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerOutcome {
    /// Processed successfully; remove from the queue
    Ack,
    /// Handler failed; negative-acknowledge without requeue
    Nack,
    /// Poison message that cannot be deserialized; drop it
    Reject,
}

#[derive(Debug, Clone, Copy)]
enum QueueKind {
    WelcomeEmail,
    GenerateReport,
}

/// Pulls jobs from the named queues and drives the domain services
pub struct JobConsumer {
    broker: Arc<BrokerClient>,
    user_service: Arc<UserService>,
    report_service: Arc<ReportService>,
}

impl JobConsumer {
    pub fn new(
        broker: Arc<BrokerClient>,
        user_service: Arc<UserService>,
        report_service: Arc<ReportService>,
    ) -> Self {
        Self {
            broker,
            user_service,
            report_service,
        }
    }

    /// Declares the topology and runs both consume loops until the
    /// connection drops. Loops are polled concurrently, so a slow report
    /// never delays welcome-email delivery.
    pub async fn run(&self) -> Result<(), BrokerError> {
        self.broker.declare_topology().await?;

        let email_channel = self.broker.consumer_channel().await?;
        let report_channel = self.broker.consumer_channel().await?;

        tracing::info!("consumers started, waiting for messages");
        tokio::try_join!(
            self.consume(
                email_channel,
                WELCOME_EMAIL_QUEUE,
                "welcome-email-worker",
                QueueKind::WelcomeEmail,
            ),
            self.consume(
                report_channel,
                REPORTS_QUEUE,
                "report-worker",
                QueueKind::GenerateReport,
            ),
        )?;
        Ok(())
    }

    async fn consume(
        &self,
        channel: Channel,
        queue: &str,
        tag: &str,
        kind: QueueKind,
    ) -> Result<(), BrokerError> {
        let mut deliveries = channel
            .basic_consume(
                queue,
                tag,
                // no_ack stays false: the loop acknowledges explicitly
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        while let Some(delivery) = deliveries.next().await {
            let delivery = delivery?;

            let outcome = match kind {
                QueueKind::WelcomeEmail => self.handle_welcome_email(&delivery.data).await,
                QueueKind::GenerateReport => self.handle_generate_report(&delivery.data).await,
            };

            match outcome {
                HandlerOutcome::Ack => delivery.ack(BasicAckOptions::default()).await?,
                HandlerOutcome::Nack => {
                    delivery
                        .nack(BasicNackOptions {
                            requeue: false,
                            ..Default::default()
                        })
                        .await?
                }
                HandlerOutcome::Reject => {
                    delivery.reject(BasicRejectOptions { requeue: false }).await?
                }
            }
        }

        tracing::warn!(queue, "delivery stream closed");
        Ok(())
    }

    async fn handle_welcome_email(&self, body: &[u8]) -> HandlerOutcome {
        let job: WelcomeEmailJob = match serde_json::from_slice(body) {
            Ok(job) => job,
            Err(err) => {
                tracing::error!(error = %err, "undeserializable welcome email job, rejecting");
                return HandlerOutcome::Reject;
            }
        };

        match tokio::time::timeout(EMAIL_TIMEOUT, self.user_service.send_welcome_email(&job))
            .await
        {
            Ok(Ok(())) => {
                tracing::info!(user_id = job.user_id, "welcome email job processed");
                HandlerOutcome::Ack
            }
            Ok(Err(err)) => {
                tracing::error!(user_id = job.user_id, error = %err, "welcome email job failed, nacking");
                HandlerOutcome::Nack
            }
            Err(_) => {
                tracing::error!(user_id = job.user_id, "welcome email job timed out, nacking");
                HandlerOutcome::Nack
            }
        }
    }

    async fn handle_generate_report(&self, body: &[u8]) -> HandlerOutcome {
        let job: GenerateReportJob = match serde_json::from_slice(body) {
            Ok(job) => job,
            Err(err) => {
                tracing::error!(error = %err, "undeserializable report job, rejecting");
                return HandlerOutcome::Reject;
            }
        };

        match tokio::time::timeout(
            REPORT_TIMEOUT,
            self.report_service.process_report(job.report_id),
        )
        .await
        {
            Ok(Ok(())) => {
                tracing::info!(report_id = job.report_id, "report job processed");
                HandlerOutcome::Ack
            }
            Ok(Err(err)) => {
                tracing::error!(report_id = job.report_id, error = %err, "report job failed, nacking");
                HandlerOutcome::Nack
            }
            Err(_) => {
                tracing::error!(report_id = job.report_id, "report job timed out, nacking");
                HandlerOutcome::Nack
            }
        }
    }
}
