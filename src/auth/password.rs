/// Password Hashing and Verification
///
/// bcrypt is the only password primitive. The work factor is configurable so
/// tests can run at the minimum cost.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// Hash a password using bcrypt with the given work factor
///
/// # Errors
/// Returns error if the cost is out of range or hashing fails
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(AppError::from)
}

/// Check `candidate` against a stored bcrypt hash
///
/// # Errors
/// Returns error if the stored hash is malformed
pub fn verify_password(candidate: &str, stored_hash: &str) -> Result<bool, AppError> {
    verify(candidate, stored_hash).map_err(AppError::from)
}
