use async_trait::async_trait;

use crate::domain::permission::UserPermission;
use crate::domain::repositories::{PermissionRepository, RepositoryError};
use crate::infrastructure::unit_of_work::SharedTx;

/// PostgreSQL implementation of PermissionRepository, bound to one transaction
pub struct PgPermissionRepository {
    tx: SharedTx,
}

impl PgPermissionRepository {
    pub(crate) fn new(tx: SharedTx) -> Self {
        Self { tx }
    }
}

#[derive(sqlx::FromRow)]
struct PermissionRow {
    id: i64,
    user_id: i64,
    resource: String,
    can_add: bool,
    can_update: bool,
    can_delete: bool,
    can_select: bool,
    can_special: bool,
}

impl From<PermissionRow> for UserPermission {
    fn from(row: PermissionRow) -> Self {
        UserPermission {
            id: row.id,
            user_id: row.user_id,
            resource: row.resource,
            can_add: row.can_add,
            can_update: row.can_update,
            can_delete: row.can_delete,
            can_select: row.can_select,
            can_special: row.can_special,
        }
    }
}

#[async_trait]
impl PermissionRepository for PgPermissionRepository {
    async fn find(
        &self,
        user_id: i64,
        resource: &str,
    ) -> Result<Option<UserPermission>, RepositoryError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;

        let row = sqlx::query_as::<_, PermissionRow>(
            "SELECT id, user_id, resource, can_add, can_update, can_delete, can_select, \
             can_special FROM user_permissions WHERE user_id = $1 AND resource = $2",
        )
        .bind(user_id)
        .bind(resource)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(UserPermission::from))
    }
}
