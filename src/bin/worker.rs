use std::sync::Arc;

use harbor_erp::config::Config;
use harbor_erp::infrastructure::{db, UnitOfWorkFactory};
use harbor_erp::queue::BrokerClient;
use harbor_erp::services::{ReportService, UserService};
use harbor_erp::worker::JobConsumer;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!("Connecting to database...");
    let pool = match db::connect(&config).await {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to database");
            std::process::exit(1);
        }
    };
    if let Err(err) = db::ensure_schema(&pool).await {
        tracing::error!(error = %err, "failed to ensure schema");
        std::process::exit(1);
    }
    tracing::info!("Database connected successfully");

    let broker = match BrokerClient::connect(&config.broker_url).await {
        Ok(broker) => Arc::new(broker),
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to message broker");
            std::process::exit(1);
        }
    };

    // The worker consumes; it never publishes, so the services run without a
    // publisher and job emission stays an API-process concern.
    let uow_factory = UnitOfWorkFactory::new(pool);
    let user_service = Arc::new(UserService::new(
        uow_factory.clone(),
        None,
        config.totp_issuer.clone(),
    ));
    let report_service = Arc::new(ReportService::new(uow_factory, None));

    let consumer = JobConsumer::new(broker, user_service, report_service);
    if let Err(err) = consumer.run().await {
        tracing::error!(error = %err, "consumer stopped");
        std::process::exit(1);
    }
}
