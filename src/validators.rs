/// Input validators for user creation
///
/// 1. DoS protection: length limits
/// 2. Control characters are rejected in names
/// 3. Passwords are bounded by the bcrypt input limit

use crate::error::ValidationError;

const MAX_NAME_LENGTH: usize = 64;
// bcrypt only reads the first 72 bytes
const MAX_PASSWORD_BYTES: usize = 72;

/// Validates a user name and returns it trimmed
pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("name"));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong("name", MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(char::is_control) {
        return Err(ValidationError::SuspiciousContent("name"));
    }

    Ok(trimmed.to_string())
}

/// Validates a password; passwords are never trimmed
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_BYTES));
    }

    Ok(())
}
