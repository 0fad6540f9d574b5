//! Harbor ERP API Library
//!
//! This library provides the core functionality for the Harbor ERP backend,
//! including domain logic, transactional repositories, services, the message
//! broker client, and the background job consumer.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod queue;
pub mod services;
pub mod worker;
