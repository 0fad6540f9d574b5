// Authentication primitives: JWT tokens, password hashing, TOTP

pub mod jwt;
pub mod password;
pub mod totp;
