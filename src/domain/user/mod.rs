pub mod value_objects;

use chrono::{DateTime, Utc};

use value_objects::Email;

/// User identity entity backed by the `users` table
///
/// The password hash, the 2FA secret, and the recovery codes are never
/// serialized into API responses; handlers convert to `UserResponse` DTOs
/// instead of exposing this struct.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub two_factor_enabled: bool,
    pub two_factor_secret: Option<String>,
    pub two_factor_recovery_codes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Consumes one matching recovery code.
    ///
    /// Returns true and removes the code if it was present; a second call
    /// with the same code returns false. Codes are strictly single-use.
    pub fn consume_recovery_code(&mut self, code: &str) -> bool {
        match self
            .two_factor_recovery_codes
            .iter()
            .position(|c| c == code)
        {
            Some(idx) => {
                self.two_factor_recovery_codes.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Clears the 2FA secret, the enabled flag, and all recovery codes.
    pub fn clear_two_factor(&mut self) {
        self.two_factor_enabled = false;
        self.two_factor_secret = None;
        self.two_factor_recovery_codes.clear();
    }
}
