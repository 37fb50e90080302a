use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::CoreError;

/// A registered account.
///
/// Only the salted SHA-256 digest of the password is ever stored; the
/// salt is regenerated whenever the password changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    user_id: u64,
    username: String,
    hashed_password: String,
    salt: String,
    registration_date: DateTime<Utc>,
}

impl User {
    /// Create a user, validating the username (non-empty after trim)
    /// and password (at least 4 characters).
    pub fn new(user_id: u64, username: &str, password: &str) -> Result<Self, CoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CoreError::Validation(
                "Username must not be empty".into(),
            ));
        }
        if password.len() < 4 {
            return Err(CoreError::Validation(
                "Password must be at least 4 characters".into(),
            ));
        }

        let salt = generate_salt()?;
        let hashed_password = hash_password(password, &salt);

        Ok(Self {
            user_id,
            username: username.to_string(),
            hashed_password,
            salt,
            registration_date: Utc::now(),
        })
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn registration_date(&self) -> DateTime<Utc> {
        self.registration_date
    }

    /// Check a plaintext password against the stored digest.
    pub fn verify_password(&self, password: &str) -> bool {
        hash_password(password, &self.salt) == self.hashed_password
    }

    /// Replace the password, regenerating the salt.
    pub fn change_password(&mut self, new_password: &str) -> Result<(), CoreError> {
        if new_password.len() < 4 {
            return Err(CoreError::Validation(
                "Password must be at least 4 characters".into(),
            ));
        }
        self.salt = generate_salt()?;
        self.hashed_password = hash_password(new_password, &self.salt);
        Ok(())
    }
}

/// SHA-256 over password + salt, hex-encoded.
fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a random 8-byte salt, hex-encoded.
fn generate_salt() -> Result<String, CoreError> {
    let mut bytes = [0u8; 8];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| CoreError::Validation(format!("Failed to generate salt: {e}")))?;
    Ok(hex::encode(bytes))
}
