use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::permission::UserPermission;

/// Repository trait for user permissions (pure read)
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Fetches the permission row for a user on a resource.
    ///
    /// A missing row is `Ok(None)`, not an error: absence simply means no
    /// capability was granted.
    async fn find(
        &self,
        user_id: i64,
        resource: &str,
    ) -> Result<Option<UserPermission>, RepositoryError>;
}
