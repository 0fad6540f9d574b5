// Repository implementations (data access layer)
// Postgres adapters implementing the domain repository traits, each bound to
// the transaction of the unit of work that created it

pub mod pg_permission_repository;
pub mod pg_reference_repository;
pub mod pg_report_repository;
pub mod pg_user_repository;

pub use pg_permission_repository::PgPermissionRepository;
pub use pg_reference_repository::PgReferenceRepository;
pub use pg_report_repository::PgReportRepository;
pub use pg_user_repository::PgUserRepository;
