use crate::error::AppError;
use bcrypt::{hash, verify};
use std::sync::Arc;

/// Salted one-way hashing with bcrypt.
///
/// bcrypt draws a fresh salt on every call and compares digests in constant time.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    // Verified against when the account does not exist, so that both login
    // failure paths cost one bcrypt round.
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, AppError> {
        let dummy_hash = hash("studytasks-dummy-password", cost)
            .map_err(|e| AppError::internal("Failed to initialise password hasher", e))?;
        Ok(Self {
            cost,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost).map_err(|e| AppError::internal("Failed to hash password", e))
    }

    pub fn verify(&self, password: &str, hashed_password: &str) -> Result<bool, AppError> {
        verify(password, hashed_password).map_err(|e| AppError::internal("Failed to verify password", e))
    }

    /// Burns the same work as a real verification and always reports a mismatch.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = verify(password, &self.dummy_hash);
        false
    }
}
