use super::ServiceError;
use crate::domain::reference::{Country, Language, Unit};
use crate::domain::repositories::ReferenceRepository;
use crate::infrastructure::UnitOfWorkFactory;

/// Read-only lists of countries, languages, and units of measure
pub struct ReferenceService {
    uow_factory: UnitOfWorkFactory,
}

impl ReferenceService {
    pub fn new(uow_factory: UnitOfWorkFactory) -> Self {
        Self { uow_factory }
    }

    pub async fn list_countries(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Country>, ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let result = uow.reference().list_countries(limit, offset).await;
        uow.rollback().await;
        Ok(result?)
    }

    pub async fn list_languages(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Language>, ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let result = uow.reference().list_languages(limit, offset).await;
        uow.rollback().await;
        Ok(result?)
    }

    pub async fn list_units(&self, limit: i64, offset: i64) -> Result<Vec<Unit>, ServiceError> {
        let uow = self.uow_factory.begin().await?;
        let result = uow.reference().list_units(limit, offset).await;
        uow.rollback().await;
        Ok(result?)
    }
}
