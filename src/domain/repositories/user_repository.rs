use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::user::value_objects::Email;
use crate::domain::user::User;

/// Fields required to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
}

/// Optional profile mutations applied by `update`
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
}

/// Repository trait for the User entity
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Page of users ordered by an allow-listed column.
    ///
    /// `order_by` is interpolated into the query; callers must pass a column
    /// validated against the resource's sort allow-list.
    async fn find_page(
        &self,
        limit: i64,
        offset: i64,
        order_by: &str,
        descending: bool,
    ) -> Result<Vec<User>, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;

    /// Applies the given profile changes; `NotFound` if no row matched.
    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, RepositoryError>;

    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;

    /// Persists the 2FA flag, secret, and recovery codes from the entity.
    async fn save_two_factor(&self, user: &User) -> Result<(), RepositoryError>;
}
