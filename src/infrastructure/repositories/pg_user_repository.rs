use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::repositories::{NewUser, RepositoryError, UserChanges, UserRepository};
use crate::domain::user::value_objects::Email;
use crate::domain::user::User;
use crate::infrastructure::unit_of_work::SharedTx;

const USER_COLUMNS: &str = "id, name, email, password_hash, two_factor_enabled, \
     two_factor_secret, two_factor_recovery_codes, created_at, updated_at";

/// PostgreSQL implementation of UserRepository, bound to one transaction
pub struct PgUserRepository {
    tx: SharedTx,
}

impl PgUserRepository {
    pub(crate) fn new(tx: SharedTx) -> Self {
        Self { tx }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    two_factor_enabled: bool,
    two_factor_secret: Option<String>,
    two_factor_recovery_codes: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_domain(self) -> Result<User, RepositoryError> {
        let email = Email::new(self.email).map_err(RepositoryError::Corrupt)?;
        Ok(User {
            id: self.id,
            name: self.name,
            email,
            password_hash: self.password_hash,
            two_factor_enabled: self.two_factor_enabled,
            two_factor_secret: self.two_factor_secret,
            two_factor_recovery_codes: self.two_factor_recovery_codes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let sql = format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.name)
            .bind(user.email.as_str())
            .bind(&user.password_hash)
            .fetch_one(&mut **tx)
            .await?;

        row.into_domain()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        row.map(UserRow::into_domain).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&mut **tx)
            .await?;

        row.map(UserRow::into_domain).transpose()
    }

    async fn find_page(
        &self,
        limit: i64,
        offset: i64,
        order_by: &str,
        descending: bool,
    ) -> Result<Vec<User>, RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        // order_by comes from the per-resource sort allow-list, never from
        // raw request input.
        let sql = format!(
            "SELECT {} FROM users ORDER BY {} {} LIMIT $1 OFFSET $2",
            USER_COLUMNS,
            order_by,
            if descending { "DESC" } else { "ASC" }
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut **tx)
            .await?;

        rows.into_iter().map(UserRow::into_domain).collect()
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&mut **tx)
            .await?;
        Ok(count)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let sql = format!(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email), \
             updated_at = now() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email.map(|e| e.as_str().to_string()))
            .fetch_optional(&mut **tx)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.into_domain()
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn save_two_factor(&self, user: &User) -> Result<(), RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let result = sqlx::query(
            "UPDATE users SET two_factor_enabled = $2, two_factor_secret = $3, \
             two_factor_recovery_codes = $4, updated_at = now() WHERE id = $1",
        )
        .bind(user.id)
        .bind(user.two_factor_enabled)
        .bind(&user.two_factor_secret)
        .bind(&user.two_factor_recovery_codes)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
