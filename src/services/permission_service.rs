use super::ServiceError;
use crate::domain::permission::Action;
use crate::domain::repositories::PermissionRepository;
use crate::infrastructure::UnitOfWorkFactory;

/// Per-resource capability checks (pure read)
pub struct PermissionService {
    uow_factory: UnitOfWorkFactory,
}

impl PermissionService {
    pub fn new(uow_factory: UnitOfWorkFactory) -> Self {
        Self { uow_factory }
    }

    /// Resolves whether the user may perform the action on the resource.
    /// A missing permission row means denied, not an error.
    pub async fn check(
        &self,
        user_id: i64,
        resource: &str,
        action: Action,
    ) -> Result<bool, ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let result = uow.permissions().find(user_id, resource).await;
        uow.rollback().await;

        let allowed = result?
            .map(|permission| permission.allows(action))
            .unwrap_or(false);
        Ok(allowed)
    }

    /// Like `check`, but a denial is a `Forbidden` error.
    pub async fn require(
        &self,
        user_id: i64,
        resource: &str,
        action: Action,
    ) -> Result<(), ServiceError> {
        if self.check(user_id, resource, action).await? {
            Ok(())
        } else {
            Err(ServiceError::Forbidden)
        }
    }
}
