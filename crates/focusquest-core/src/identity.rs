//! Identity collaborator.
//!
//! The core only needs a stable user id and a place to keep the profile.
//! Implementations decide how credentials are checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, ValidationError};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Partial profile edit. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

pub trait IdentityProvider {
    /// Create an account, its empty progression record, and sign in.
    fn sign_up(&mut self, email: &str, password: &str, username: &str) -> Result<User>;

    fn sign_in(&mut self, email: &str, password: &str) -> Result<User>;

    fn sign_out(&mut self) -> Result<()>;

    fn current_user(&self) -> Result<Option<User>>;

    /// Apply `update` to the signed-in user.
    fn update_profile(&mut self, update: &ProfileUpdate) -> Result<User>;
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(ValidationError::field("email", "must be a valid email address"))
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::field("username", "must not be empty"));
    }
    Ok(())
}

pub fn validate_sign_up(email: &str, password: &str, username: &str) -> Result<(), ValidationError> {
    validate_email(email)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::field(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    validate_username(username)
}

/// Hex SHA-256 of `salt:password`.
pub fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
