// Transactional unit of work
//
// One UnitOfWork wraps one database transaction. Repositories handed out by
// the accessors are bound to that transaction, so a sequence of repository
// calls becomes atomic: everything is visible after commit() or nothing is.

use std::sync::Arc;

use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use crate::domain::repositories::RepositoryError;
use crate::infrastructure::repositories::{
    PgPermissionRepository, PgReferenceRepository, PgReportRepository, PgUserRepository,
};

/// Transaction handle shared between a unit of work and its repositories.
///
/// The `Option` empties exactly once, on commit or rollback; repository calls
/// after that fail with `TransactionClosed` instead of touching the pool.
pub(crate) type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// A single-transaction scope over the entity repositories
pub struct UnitOfWork {
    tx: SharedTx,
}

impl UnitOfWork {
    async fn begin(pool: &PgPool) -> Result<Self, RepositoryError> {
        let tx = pool.begin().await?;
        Ok(Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        })
    }

    pub fn users(&self) -> PgUserRepository {
        PgUserRepository::new(Arc::clone(&self.tx))
    }

    pub fn reports(&self) -> PgReportRepository {
        PgReportRepository::new(Arc::clone(&self.tx))
    }

    pub fn permissions(&self) -> PgPermissionRepository {
        PgPermissionRepository::new(Arc::clone(&self.tx))
    }

    pub fn reference(&self) -> PgReferenceRepository {
        PgReferenceRepository::new(Arc::clone(&self.tx))
    }

    /// Commits the transaction.
    ///
    /// On failure the transaction is already gone (the driver rolls back a
    /// consumed transaction) and the storage error surfaces to the caller.
    pub async fn commit(&self) -> Result<(), RepositoryError> {
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or(RepositoryError::TransactionClosed)?;
        tx.commit().await.map_err(RepositoryError::from)
    }

    /// Rolls back the transaction if it is still open.
    ///
    /// Idempotent: calling it twice, or after a successful commit, is a no-op.
    /// Services call this unconditionally on every non-commit exit path.
    pub async fn rollback(&self) {
        if let Some(tx) = self.tx.lock().await.take() {
            if let Err(err) = tx.rollback().await {
                tracing::error!(error = %err, "failed to roll back transaction");
            }
        }
    }
}

/// Stateless factory handing out one fresh unit of work per logical operation
#[derive(Clone)]
pub struct UnitOfWorkFactory {
    pool: PgPool,
}

impl UnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Begins a new transaction and returns the unit of work owning it.
    pub async fn begin(&self) -> Result<UnitOfWork, RepositoryError> {
        UnitOfWork::begin(&self.pool).await
    }
}
