// Time-based one-time passwords and recovery codes
// RFC 6238 defaults: SHA-1, 6 digits, 30 second step, ±1 step skew

use data_encoding::{BASE32, BASE32_NOPAD};
use rand::RngCore;
use totp_rs::{Algorithm, Secret, TOTP};

/// Generates a fresh base32-encoded shared secret (20 random bytes).
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE32.encode(&bytes)
}

/// Builds the `otpauth://` provisioning URI for authenticator apps.
///
/// Clients render this as a QR code; the server only hands out the URI.
pub fn provisioning_uri(issuer: &str, account: &str, secret: &str) -> String {
    format!(
        "otpauth://totp/{}:{}?secret={}&issuer={}&algorithm=SHA1&digits=6&period=30",
        urlencoding::encode(issuer),
        urlencoding::encode(account),
        secret,
        urlencoding::encode(issuer)
    )
}

/// Verifies a candidate code against a base32 secret.
///
/// An undecodable secret or clock error counts as a failed verification
/// rather than an internal error: the caller only cares about yes or no.
pub fn verify_code(secret: &str, code: &str) -> bool {
    match build_totp(secret) {
        Some(totp) => totp.check_current(code).unwrap_or(false),
        None => false,
    }
}

/// Generates `count` single-use recovery codes (8 random bytes each).
pub fn generate_recovery_codes(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let mut bytes = [0u8; 8];
            rng.fill_bytes(&mut bytes);
            BASE32_NOPAD.encode(&bytes).to_lowercase()
        })
        .collect()
}

fn build_totp(secret: &str) -> Option<TOTP> {
    let bytes = Secret::Encoded(secret.to_string()).to_bytes().ok()?;
    TOTP::new(Algorithm::SHA1, 6, 1, 30, bytes).ok()
}
