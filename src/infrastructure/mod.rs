// Infrastructure layer module
// Database adapters, the transactional unit of work, and repository
// implementations live here

pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory};
