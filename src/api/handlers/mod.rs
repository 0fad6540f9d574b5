pub mod auth;
pub mod reference;
pub mod reports;
pub mod two_factor;
pub mod users;
