// Domain layer module exports
// Domain types are independent of infrastructure concerns

pub mod jobs;
pub mod permission;
pub mod reference;
pub mod report;
pub mod repositories;
pub mod user;
