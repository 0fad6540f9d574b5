//! Integration tests for the service layer
//!
//! These tests exercise the full stack below the HTTP surface: services,
//! unit of work, and Postgres repositories. The broker is replaced with a
//! fake publisher so the commit-before-publish contract can be probed
//! without RabbitMQ.
//!
//! They need a live PostgreSQL instance (DATABASE_URL) and are ignored by
//! default; run them with `cargo test -- --ignored`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use harbor_erp::domain::permission::Action;
use harbor_erp::domain::report::ReportStatus;
use harbor_erp::infrastructure::{db, UnitOfWorkFactory};
use harbor_erp::queue::{BrokerError, JobPublisher};
use harbor_erp::services::{
    CreateUserRequest, PermissionService, ReportService, ServiceError, UserService,
};
use sqlx::PgPool;
use totp_rs::{Algorithm, Secret, TOTP};

/// Publisher that always fails, standing in for an unreachable broker
struct FailingPublisher;

#[async_trait]
impl JobPublisher for FailingPublisher {
    async fn publish(
        &self,
        _exchange: &str,
        _routing_key: &str,
        _body: &[u8],
    ) -> Result<(), BrokerError> {
        Err(BrokerError::Timeout(Duration::from_secs(5)))
    }
}

/// Publisher that records how many jobs it was handed
#[derive(Default)]
struct CountingPublisher {
    published: AtomicUsize,
}

#[async_trait]
impl JobPublisher for CountingPublisher {
    async fn publish(
        &self,
        _exchange: &str,
        _routing_key: &str,
        _body: &[u8],
    ) -> Result<(), BrokerError> {
        self.published.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Set up test database connection pool
async fn setup_test_db() -> PgPool {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    db::ensure_schema(&pool).await.expect("Failed to ensure schema");
    pool
}

fn unique_email(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{}-{}@example.com", prefix, nanos)
}

fn user_service(pool: &PgPool, publisher: Option<Arc<dyn JobPublisher>>) -> UserService {
    UserService::new(UnitOfWorkFactory::new(pool.clone()), publisher, "Harbor ERP")
}

fn report_service(pool: &PgPool, publisher: Option<Arc<dyn JobPublisher>>) -> ReportService {
    ReportService::new(UnitOfWorkFactory::new(pool.clone()), publisher)
}

/// Current TOTP code for a base32 secret, computed the way a client app would
fn current_totp_code(secret: &str) -> String {
    let totp = TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        Secret::Encoded(secret.to_string())
            .to_bytes()
            .expect("valid base32 secret"),
    )
    .expect("valid TOTP parameters");
    totp.generate_current().expect("system clock")
}

async fn cleanup_user(pool: &PgPool, email: &str) {
    sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await
        .expect("Failed to cleanup test user");
}

async fn cleanup_report(pool: &PgPool, id: i64) {
    sqlx::query("DELETE FROM reports WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .expect("Failed to cleanup test report");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_create_user_publishes_after_commit_and_hides_secrets() {
    let pool = setup_test_db().await;
    let publisher = Arc::new(CountingPublisher::default());
    let service = user_service(&pool, Some(publisher.clone()));
    let email = unique_email("svc-create");

    let response = service
        .create_user(CreateUserRequest {
            name: "Alice".to_string(),
            email: email.clone(),
            password: "correct horse battery".to_string(),
        })
        .await
        .expect("Failed to create user");

    assert_eq!(response.email, email);
    assert!(!response.two_factor_enabled);
    assert_eq!(
        publisher.published.load(Ordering::SeqCst),
        1,
        "Exactly one welcome email job should be published"
    );

    let body = serde_json::to_string(&response).expect("serialize response");
    assert!(
        !body.contains("password") && !body.contains("hash"),
        "Response must not carry credential material: {}",
        body
    );

    cleanup_user(&pool, &email).await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_create_user_duplicate_email_conflicts() {
    let pool = setup_test_db().await;
    let service = user_service(&pool, None);
    let email = unique_email("svc-duplicate");

    let request = CreateUserRequest {
        name: "First".to_string(),
        email: email.clone(),
        password: "password-one".to_string(),
    };
    service
        .create_user(request.clone())
        .await
        .expect("First creation should succeed");

    let result = service.create_user(request).await;
    assert!(
        matches!(result, Err(ServiceError::EmailExists)),
        "Second creation with the same email should conflict"
    );

    cleanup_user(&pool, &email).await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_create_user_survives_publish_failure() {
    let pool = setup_test_db().await;
    let service = user_service(&pool, Some(Arc::new(FailingPublisher)));
    let email = unique_email("svc-broker-down");

    // The user is committed before the publish attempt, so a dead broker
    // must not fail the signup.
    let response = service
        .create_user(CreateUserRequest {
            name: "Bob".to_string(),
            email: email.clone(),
            password: "another password".to_string(),
        })
        .await
        .expect("Signup should succeed despite a failing publisher");

    let fetched = service
        .get_user(response.id)
        .await
        .expect("User should be durably stored");
    assert_eq!(fetched.email, email);

    cleanup_user(&pool, &email).await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_authenticate_does_not_distinguish_failure_causes() {
    let pool = setup_test_db().await;
    let service = user_service(&pool, None);
    let email = unique_email("svc-auth");

    service
        .create_user(CreateUserRequest {
            name: "Carol".to_string(),
            email: email.clone(),
            password: "the right password".to_string(),
        })
        .await
        .expect("Failed to create user");

    let unknown = service
        .authenticate("nobody@example.com", "whatever")
        .await
        .expect_err("Unknown email should fail");
    let wrong = service
        .authenticate(&email, "the wrong password")
        .await
        .expect_err("Wrong password should fail");

    assert!(matches!(unknown, ServiceError::InvalidCredentials));
    assert!(matches!(wrong, ServiceError::InvalidCredentials));

    let user = service
        .authenticate(&email, "the right password")
        .await
        .expect("Correct credentials should succeed");
    assert_eq!(user.email.as_str(), email);

    cleanup_user(&pool, &email).await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_request_report_survives_publish_failure() {
    let pool = setup_test_db().await;
    let service = report_service(&pool, Some(Arc::new(FailingPublisher)));

    let report = service
        .request_report("user_summary", serde_json::json!({"scope": "all"}))
        .await
        .expect("Request should succeed despite a failing publisher");

    // The pending row outlives the failed publish and stays queryable.
    let fetched = service
        .get_report_status(report.id)
        .await
        .expect("Report should be durably stored");
    assert_eq!(fetched.status, ReportStatus::Pending);

    cleanup_report(&pool, report.id).await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_process_report_completes_with_result() {
    let pool = setup_test_db().await;
    let service = report_service(&pool, None);

    let report = service
        .request_report("user_summary", serde_json::json!({}))
        .await
        .expect("Failed to request report");

    service
        .process_report(report.id)
        .await
        .expect("Processing should succeed");

    let processed = service
        .get_report_status(report.id)
        .await
        .expect("Failed to fetch report");
    assert_eq!(processed.status, ReportStatus::Completed);
    let result = processed.result.expect("Completed report should carry a result");
    assert_eq!(result["report_type"], "user_summary");
    assert!(result["total_users"].is_i64() || result["total_users"].is_u64());

    cleanup_report(&pool, report.id).await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_process_report_failure_is_durably_recorded() {
    let pool = setup_test_db().await;
    let service = report_service(&pool, None);

    // The type passes request validation but no computation exists for it.
    let report = service
        .request_report("unsupported_type", serde_json::json!({}))
        .await
        .expect("Failed to request report");

    // A computation failure is recorded, not propagated: the job handler
    // acks and the failure lives in the row.
    service
        .process_report(report.id)
        .await
        .expect("Processing should commit the failure without erroring");

    let processed = service
        .get_report_status(report.id)
        .await
        .expect("Failed to fetch report");
    assert_eq!(processed.status, ReportStatus::Failed);
    assert!(processed.result.is_none(), "Failed report must carry no result");
    let error = processed
        .error
        .expect("Failed report should carry an error message");
    assert!(!error.is_empty());

    cleanup_report(&pool, report.id).await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_process_report_duplicate_delivery_is_skipped() {
    let pool = setup_test_db().await;
    let service = report_service(&pool, None);

    let report = service
        .request_report("user_summary", serde_json::json!({}))
        .await
        .expect("Failed to request report");

    service
        .process_report(report.id)
        .await
        .expect("First processing should succeed");

    // At-least-once delivery: a redelivered job for a finished report is a
    // no-op, not an error, and must not clobber the result.
    service
        .process_report(report.id)
        .await
        .expect("Redelivered job should be skipped without error");

    let processed = service
        .get_report_status(report.id)
        .await
        .expect("Failed to fetch report");
    assert_eq!(processed.status, ReportStatus::Completed);

    cleanup_report(&pool, report.id).await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_process_report_unknown_id_is_not_found() {
    let pool = setup_test_db().await;
    let service = report_service(&pool, None);

    let result = service.process_report(i64::MAX).await;
    assert!(matches!(result, Err(ServiceError::NotFound)));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_duplicate_welcome_email_delivery_is_harmless() {
    let pool = setup_test_db().await;
    let service = user_service(&pool, None);
    let email = unique_email("svc-redeliver");

    let created = service
        .create_user(CreateUserRequest {
            name: "Grace".to_string(),
            email: email.clone(),
            password: "redelivery password".to_string(),
        })
        .await
        .expect("Failed to create user");

    let job = harbor_erp::domain::jobs::WelcomeEmailJob {
        user_id: created.id,
        email: email.clone(),
        name: "Grace".to_string(),
    };

    // At-least-once delivery: the handler runs cleanly for every copy.
    service
        .send_welcome_email(&job)
        .await
        .expect("First delivery should succeed");
    service
        .send_welcome_email(&job)
        .await
        .expect("Redelivered copy should also succeed");

    // A job for a user deleted since enqueue is a no-op, not a failure.
    service.delete_user(created.id).await.expect("delete user");
    service
        .send_welcome_email(&job)
        .await
        .expect("Delivery for a deleted user should be a no-op");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_two_factor_recovery_code_is_single_use() {
    let pool = setup_test_db().await;
    let service = user_service(&pool, None);
    let email = unique_email("svc-2fa");

    let created = service
        .create_user(CreateUserRequest {
            name: "Dave".to_string(),
            email: email.clone(),
            password: "a fine password".to_string(),
        })
        .await
        .expect("Failed to create user");

    let setup = service
        .setup_two_factor(created.id)
        .await
        .expect("Failed to set up 2FA");
    let recovery_codes = service
        .enable_two_factor(created.id, &current_totp_code(&setup.secret))
        .await
        .expect("Failed to enable 2FA");
    assert_eq!(recovery_codes.len(), 10);

    // A TOTP code verifies without consuming anything.
    service
        .verify_two_factor(created.id, &current_totp_code(&setup.secret))
        .await
        .expect("TOTP code should verify");

    // A recovery code verifies once...
    let code = &recovery_codes[0];
    service
        .verify_two_factor(created.id, code)
        .await
        .expect("First recovery code use should succeed");

    // ...and only once.
    let reuse = service.verify_two_factor(created.id, code).await;
    assert!(
        matches!(reuse, Err(ServiceError::InvalidTwoFactorCode)),
        "Reused recovery code should be rejected"
    );

    // A different recovery code is still valid.
    service
        .verify_two_factor(created.id, &recovery_codes[1])
        .await
        .expect("Unused recovery code should succeed");

    cleanup_user(&pool, &email).await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_setup_is_rejected_while_two_factor_enabled() {
    let pool = setup_test_db().await;
    let service = user_service(&pool, None);
    let email = unique_email("svc-2fa-resetup");

    let created = service
        .create_user(CreateUserRequest {
            name: "Heidi".to_string(),
            email: email.clone(),
            password: "re-setup password".to_string(),
        })
        .await
        .expect("Failed to create user");

    let setup = service
        .setup_two_factor(created.id)
        .await
        .expect("Failed to set up 2FA");

    // Re-running setup before enablement is fine and rotates the secret.
    let second = service
        .setup_two_factor(created.id)
        .await
        .expect("Setup should be repeatable while 2FA is off");
    assert_ne!(second.secret, setup.secret);

    service
        .enable_two_factor(created.id, &current_totp_code(&second.secret))
        .await
        .expect("Failed to enable 2FA");

    // Once enabled, setup is rejected and the enrolled secret stays valid.
    let rejected = service.setup_two_factor(created.id).await;
    assert!(
        matches!(rejected, Err(ServiceError::Validation(_))),
        "Setup while enabled should be rejected"
    );
    service
        .verify_two_factor(created.id, &current_totp_code(&second.secret))
        .await
        .expect("Enrolled authenticator must keep working");

    cleanup_user(&pool, &email).await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_disable_two_factor_clears_enforcement() {
    let pool = setup_test_db().await;
    let service = user_service(&pool, None);
    let email = unique_email("svc-2fa-disable");

    let created = service
        .create_user(CreateUserRequest {
            name: "Erin".to_string(),
            email: email.clone(),
            password: "yet another password".to_string(),
        })
        .await
        .expect("Failed to create user");

    let setup = service
        .setup_two_factor(created.id)
        .await
        .expect("Failed to set up 2FA");
    service
        .enable_two_factor(created.id, &current_totp_code(&setup.secret))
        .await
        .expect("Failed to enable 2FA");

    service
        .disable_two_factor(created.id)
        .await
        .expect("Failed to disable 2FA");

    let fetched = service.get_user(created.id).await.expect("fetch user");
    assert!(!fetched.two_factor_enabled);

    // With 2FA off, verification succeeds trivially even for garbage input.
    service
        .verify_two_factor(created.id, "000000")
        .await
        .expect("Verification should be a no-op when 2FA is disabled");

    cleanup_user(&pool, &email).await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_permission_checks_resolve_per_action() {
    let pool = setup_test_db().await;
    let users = user_service(&pool, None);
    let permissions = PermissionService::new(UnitOfWorkFactory::new(pool.clone()));
    let email = unique_email("svc-perm");

    let created = users
        .create_user(CreateUserRequest {
            name: "Frank".to_string(),
            email: email.clone(),
            password: "permission password".to_string(),
        })
        .await
        .expect("Failed to create user");

    sqlx::query(
        "INSERT INTO user_permissions (user_id, resource, can_select, can_update)
         VALUES ($1, 'users', TRUE, TRUE)",
    )
    .bind(created.id)
    .execute(&pool)
    .await
    .expect("Failed to grant permissions");

    assert!(permissions
        .check(created.id, "users", Action::Select)
        .await
        .expect("check"));
    assert!(permissions
        .check(created.id, "users", Action::Update)
        .await
        .expect("check"));
    assert!(!permissions
        .check(created.id, "users", Action::Delete)
        .await
        .expect("check"));

    // No row for the resource at all means denied, not an error.
    assert!(!permissions
        .check(created.id, "reports", Action::Select)
        .await
        .expect("check"));

    let denied = permissions
        .require(created.id, "users", Action::Delete)
        .await;
    assert!(matches!(denied, Err(ServiceError::Forbidden)));

    cleanup_user(&pool, &email).await;
}
