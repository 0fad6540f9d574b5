use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ServiceError;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::totp;
use crate::domain::jobs::WelcomeEmailJob;
use crate::domain::repositories::{NewUser, UserChanges, UserRepository};
use crate::domain::user::value_objects::Email;
use crate::domain::user::User;
use crate::infrastructure::UnitOfWorkFactory;
use crate::queue::{JobPublisher, APP_EXCHANGE, WELCOME_EMAIL_KEY};

/// Request body for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Optional profile mutations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Public view of a user
///
/// Deliberately omits the password hash, the 2FA secret, and the recovery
/// codes; this struct is the only user shape that crosses the API boundary.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name.clone(),
            email: user.email.as_str().to_string(),
            two_factor_enabled: user.two_factor_enabled,
            created_at: user.created_at,
        }
    }
}

/// Result of provisioning a new 2FA secret
#[derive(Debug, Clone, Serialize)]
pub struct TwoFactorSetup {
    pub secret: String,
    /// `otpauth://` URI the client renders as a QR code
    pub otpauth_url: String,
}

/// User signup, authentication, profile, and 2FA flows
pub struct UserService {
    uow_factory: UnitOfWorkFactory,
    /// Absent in the worker process, which never publishes jobs itself
    publisher: Option<Arc<dyn JobPublisher>>,
    totp_issuer: String,
}

impl UserService {
    pub fn new(
        uow_factory: UnitOfWorkFactory,
        publisher: Option<Arc<dyn JobPublisher>>,
        totp_issuer: impl Into<String>,
    ) -> Self {
        Self {
            uow_factory,
            publisher,
            totp_issuer: totp_issuer.into(),
        }
    }

    /// Creates a user and, after the commit, queues the welcome email.
    ///
    /// The duplicate-email read runs in the same transaction as the insert;
    /// the unique constraint on `users.email` remains the real guarantor
    /// against races, the read is only an early exit.
    pub async fn create_user(
        &self,
        req: CreateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        if req.name.is_empty() || req.email.is_empty() || req.password.is_empty() {
            return Err(ServiceError::Validation(
                "name, email, and password are required".to_string(),
            ));
        }
        let email = Email::new(&req.email)
            .map_err(|_| ServiceError::Validation("invalid email format".to_string()))?;

        let password_hash = hash_password(&req.password).map_err(|e| {
            tracing::error!(error = %e, "failed to hash password");
            ServiceError::Internal
        })?;

        let uow = self.uow_factory.begin().await?;
        let users = uow.users();

        match users.find_by_email(email.as_str()).await {
            Ok(Some(_)) => {
                uow.rollback().await;
                return Err(ServiceError::EmailExists);
            }
            Ok(None) => {}
            Err(err) => {
                uow.rollback().await;
                return Err(err.into());
            }
        }

        let created = match users
            .create(NewUser {
                name: req.name,
                email,
                password_hash,
            })
            .await
        {
            Ok(user) => user,
            Err(err) => {
                uow.rollback().await;
                return Err(err.into());
            }
        };

        uow.commit().await?;

        // Publish only after the commit: a consumer must never see a job for
        // a row that is not durably visible. Email delivery is best-effort;
        // the created user is the authoritative success signal.
        self.publish_welcome_email(&created).await;

        Ok(UserResponse::from(&created))
    }

    /// Checks credentials; unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let result = uow.users().find_by_email(email).await;
        uow.rollback().await;

        let user = match result {
            Ok(Some(user)) => user,
            Ok(None) => return Err(ServiceError::InvalidCredentials),
            Err(err) => return Err(err.into()),
        };

        let valid = verify_password(password, &user.password_hash).map_err(|e| {
            tracing::error!(error = %e, "password verification failed");
            ServiceError::Internal
        })?;
        if !valid {
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<UserResponse, ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let result = uow.users().find_by_id(id).await;
        uow.rollback().await;

        match result {
            Ok(Some(user)) => Ok(UserResponse::from(&user)),
            Ok(None) => Err(ServiceError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    /// Page of users. `order_by` must already be allow-list validated.
    pub async fn list_users(
        &self,
        limit: i64,
        offset: i64,
        order_by: &str,
        descending: bool,
    ) -> Result<Vec<UserResponse>, ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let result = uow.users().find_page(limit, offset, order_by, descending).await;
        uow.rollback().await;

        let users = result?;
        Ok(users.iter().map(UserResponse::from).collect())
    }

    pub async fn update_user(
        &self,
        id: i64,
        req: UpdateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        let email = match &req.email {
            Some(raw) => Some(
                Email::new(raw)
                    .map_err(|_| ServiceError::Validation("invalid email format".to_string()))?,
            ),
            None => None,
        };

        let uow = self.uow_factory.begin().await?;
        let updated = match uow
            .users()
            .update(
                id,
                UserChanges {
                    name: req.name,
                    email,
                },
            )
            .await
        {
            Ok(user) => user,
            Err(err) => {
                uow.rollback().await;
                return Err(err.into());
            }
        };
        uow.commit().await?;

        Ok(UserResponse::from(&updated))
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ServiceError> {
        let uow = self.uow_factory.begin().await?;
        if let Err(err) = uow.users().delete(id).await {
            uow.rollback().await;
            return Err(err.into());
        }
        uow.commit().await?;
        Ok(())
    }

    /// Provisions a new shared secret without enabling enforcement yet.
    ///
    /// Rejected while 2FA is enabled: replacing the secret under a live
    /// enrollment would silently break the user's authenticator. Disable
    /// first, then set up again.
    pub async fn setup_two_factor(&self, user_id: i64) -> Result<TwoFactorSetup, ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let users = uow.users();

        let mut user = match users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                uow.rollback().await;
                return Err(ServiceError::NotFound);
            }
            Err(err) => {
                uow.rollback().await;
                return Err(err.into());
            }
        };

        if user.two_factor_enabled {
            uow.rollback().await;
            return Err(ServiceError::Validation(
                "two-factor authentication is already enabled".to_string(),
            ));
        }

        let secret = totp::generate_secret();
        user.two_factor_secret = Some(secret.clone());

        if let Err(err) = users.save_two_factor(&user).await {
            uow.rollback().await;
            return Err(err.into());
        }
        uow.commit().await?;

        let otpauth_url =
            totp::provisioning_uri(&self.totp_issuer, user.email.as_str(), &secret);
        Ok(TwoFactorSetup {
            secret,
            otpauth_url,
        })
    }

    /// Turns enforcement on after the user proves possession of the secret.
    /// Returns the freshly issued single-use recovery codes; they are shown
    /// exactly once.
    pub async fn enable_two_factor(
        &self,
        user_id: i64,
        code: &str,
    ) -> Result<Vec<String>, ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let users = uow.users();

        let mut user = match users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                uow.rollback().await;
                return Err(ServiceError::NotFound);
            }
            Err(err) => {
                uow.rollback().await;
                return Err(err.into());
            }
        };

        let secret = match user.two_factor_secret.clone() {
            Some(secret) => secret,
            None => {
                uow.rollback().await;
                return Err(ServiceError::TwoFactorSetupIncomplete);
            }
        };

        if !totp::verify_code(&secret, code) {
            uow.rollback().await;
            return Err(ServiceError::InvalidTwoFactorCode);
        }

        user.two_factor_enabled = true;
        let recovery_codes = totp::generate_recovery_codes(10);
        user.two_factor_recovery_codes = recovery_codes.clone();

        if let Err(err) = users.save_two_factor(&user).await {
            uow.rollback().await;
            return Err(err.into());
        }
        uow.commit().await?;

        Ok(recovery_codes)
    }

    /// Clears secret, flag, and all recovery codes in one transaction.
    pub async fn disable_two_factor(&self, user_id: i64) -> Result<(), ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let users = uow.users();

        let mut user = match users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                uow.rollback().await;
                return Err(ServiceError::NotFound);
            }
            Err(err) => {
                uow.rollback().await;
                return Err(err.into());
            }
        };

        user.clear_two_factor();

        if let Err(err) = users.save_two_factor(&user).await {
            uow.rollback().await;
            return Err(err.into());
        }
        uow.commit().await?;
        Ok(())
    }

    /// Verifies a time-based code, or consumes exactly one recovery code.
    ///
    /// Succeeds trivially when 2FA is not enabled. A consumed recovery code
    /// is removed in the same transaction, so a second use of the same code
    /// fails with `InvalidTwoFactorCode`.
    pub async fn verify_two_factor(&self, user_id: i64, code: &str) -> Result<(), ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let users = uow.users();

        let mut user = match users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                uow.rollback().await;
                return Err(ServiceError::NotFound);
            }
            Err(err) => {
                uow.rollback().await;
                return Err(err.into());
            }
        };

        if !user.two_factor_enabled {
            uow.rollback().await;
            return Ok(());
        }

        let secret = user.two_factor_secret.clone().unwrap_or_default();
        if totp::verify_code(&secret, code) {
            uow.rollback().await;
            return Ok(());
        }

        if user.consume_recovery_code(code) {
            if let Err(err) = users.save_two_factor(&user).await {
                uow.rollback().await;
                return Err(err.into());
            }
            uow.commit().await?;
            return Ok(());
        }

        uow.rollback().await;
        Err(ServiceError::InvalidTwoFactorCode)
    }

    /// Worker-side handler: delivers the welcome email for a queued job.
    ///
    /// The job payload is not trusted; the user is re-read from the store
    /// and a user deleted since enqueue is a no-op rather than a failure.
    pub async fn send_welcome_email(&self, job: &WelcomeEmailJob) -> Result<(), ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let result = uow.users().find_by_id(job.user_id).await;
        uow.rollback().await;

        let user = match result {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::info!(user_id = job.user_id, "user gone, skipping welcome email");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(user_id = user.id, email = %user.email, "sending welcome email");
        // Simulated SMTP round trip; a mail transport would slot in here.
        tokio::time::sleep(Duration::from_millis(250)).await;
        tracing::info!(email = %user.email, "welcome email sent");
        Ok(())
    }

    async fn publish_welcome_email(&self, user: &User) {
        let Some(publisher) = &self.publisher else {
            return;
        };

        let job = WelcomeEmailJob {
            user_id: user.id,
            email: user.email.as_str().to_string(),
            name: user.name.clone(),
        };
        let body = match serde_json::to_vec(&job) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(user_id = user.id, error = %err, "could not serialize welcome email job");
                return;
            }
        };

        match publisher
            .publish(APP_EXCHANGE, WELCOME_EMAIL_KEY, &body)
            .await
        {
            Ok(()) => tracing::info!(user_id = user.id, "welcome email job published"),
            Err(err) => {
                tracing::error!(user_id = user.id, error = %err, "could not publish welcome email job")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn user_response_never_carries_secrets() {
        let user = User {
            id: 5,
            name: "Test".to_string(),
            email: Email::new("t@example.com").unwrap(),
            password_hash: "$2b$12$secret-hash".to_string(),
            two_factor_enabled: true,
            two_factor_secret: Some("TOPSECRET".to_string()),
            two_factor_recovery_codes: vec!["code-one".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(UserResponse::from(&user)).unwrap();
        let body = value.to_string();

        assert!(!body.contains("secret-hash"));
        assert!(!body.contains("TOPSECRET"));
        assert!(!body.contains("code-one"));
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["id"], 5);
        assert_eq!(value["email"], "t@example.com");
    }
}
