//! Authentication primitives.
//!
//! Stored credentials are salted argon2 hashes — a submitted password is
//! verified against the hash, never compared as plaintext. Logged-in
//! callers hold an opaque bearer token mapped to their user id in
//! server memory; tokens die with the process.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Verify a submitted password against a stored hash. Malformed stored
/// hashes verify as false rather than erroring.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// In-memory bearer-token registry: token → user id.
#[derive(Default)]
pub struct SessionManager {
    tokens: RwLock<HashMap<String, String>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for a user.
    pub fn issue(&self, user_id: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens
            .write()
            .unwrap()
            .insert(token.clone(), user_id.to_string());
        token
    }

    /// Resolve a token to its user id, if the session exists.
    pub fn resolve(&self, token: &str) -> Option<String> {
        self.tokens.read().unwrap().get(token).cloned()
    }

    /// Drop a session. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.write().unwrap().remove(token).is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
