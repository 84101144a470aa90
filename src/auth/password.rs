/// Password Hashing and Verification
///
/// The plaintext is first run through HMAC-SHA256 keyed with the server-side
/// pepper, and the hex digest is what bcrypt sees. bcrypt only reads the first
/// 72 bytes of its input; the 64-byte digest always fits, so every character
/// of the password and the whole pepper take part in the hash. A leaked
/// `users` table is not enough to brute-force passwords offline.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Verified against when a login names an unknown user, so that both
/// failure paths pay the same bcrypt cost.
const DUMMY_PASSWORD: &str = "authflow-dummy-password";

#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    pepper: String,
    dummy_digest: String,
}

impl PasswordHasher {
    /// # Errors
    /// Fails if bcrypt rejects `cost`.
    pub fn new(cost: u32, pepper: impl Into<String>) -> Result<Self, AppError> {
        let mut hasher = Self {
            cost,
            pepper: pepper.into(),
            dummy_digest: String::new(),
        };
        hasher.dummy_digest = hasher.hash(DUMMY_PASSWORD)?;
        Ok(hasher)
    }

    /// Hash a plaintext password. Each call uses a new random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        bcrypt::hash(self.peppered(plaintext)?, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a plaintext password against a stored digest.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AppError> {
        bcrypt::verify(self.peppered(plaintext)?, digest)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }

    /// Spend one verification's worth of work on a password for a user that
    /// does not exist. Always fails.
    pub fn verify_unknown_user(&self, plaintext: &str) -> Result<bool, AppError> {
        self.verify(plaintext, &self.dummy_digest)?;
        Ok(false)
    }

    fn peppered(&self, plaintext: &str) -> Result<String, AppError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.pepper.as_bytes())
            .map_err(|e| AppError::Internal(format!("Invalid pepper: {}", e)))?;
        mac.update(plaintext.as_bytes());
        Ok(format!("{:x}", mac.finalize().into_bytes()))
    }
}
