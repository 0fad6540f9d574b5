use std::sync::Arc;

use harbor_erp::api::{self, AppState};
use harbor_erp::config::Config;
use harbor_erp::infrastructure::{db, UnitOfWorkFactory};
use harbor_erp::queue::{BrokerClient, JobPublisher};
use harbor_erp::services::{PermissionService, ReferenceService, ReportService, UserService};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    // Connect to database
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

    // Connect to the message broker and declare the topology up front, so
    // publishes never race queue creation.
    let broker = match BrokerClient::connect(&config.broker_url).await {
        Ok(broker) => Arc::new(broker),
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to message broker");
            std::process::exit(1);
        }
    };
    if let Err(err) = broker.declare_topology().await {
        tracing::error!(error = %err, "failed to declare broker topology");
        std::process::exit(1);
    }

    let publisher: Arc<dyn JobPublisher> = broker;
    let uow_factory = UnitOfWorkFactory::new(pool);

    let state = AppState {
        users: Arc::new(UserService::new(
            uow_factory.clone(),
            Some(Arc::clone(&publisher)),
            config.totp_issuer.clone(),
        )),
        reports: Arc::new(ReportService::new(
            uow_factory.clone(),
            Some(Arc::clone(&publisher)),
        )),
        permissions: Arc::new(PermissionService::new(uow_factory.clone())),
        reference: Arc::new(ReferenceService::new(uow_factory)),
        config: Arc::clone(&config),
    };

    let app = api::router(state);

    // Start server
    tracing::info!("Server listening on {}", config.bind_addr);
    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, addr = %config.bind_addr, "failed to bind address");
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = %err, "server failed");
        std::process::exit(1);
    }
}
