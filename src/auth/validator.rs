//! Pure rule checks for login and register form input.
//!
//! Validation runs before any network call so malformed input never costs a
//! round-trip. Rules are evaluated in a fixed order and the first failure
//! wins; the error's `Display` string is surfaced to the user verbatim.

use thiserror::Error;

/// Password length bounds for registration
const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_MAX_CHARS: usize = 20;

/// Minimum username length for registration
const USERNAME_MIN_CHARS: usize = 3;

/// Login form input. Transient; never persisted.
#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Register form input. `confirm_password` is checked locally and never
/// leaves the client.
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Email and password are required.")]
    EmptyEmail,
    #[error("Email and password are required.")]
    EmptyPassword,
    #[error("Password must be 8 to 20 characters and contain at least one lowercase letter, one uppercase letter, one digit, and one special character.")]
    WeakPassword,
    #[error("Both passwords must match.")]
    PasswordMismatch,
    #[error("Username must be at least 3 characters and contain only letters and numbers.")]
    InvalidUsername,
    #[error("Email is required.")]
    MissingEmail,
}

/// Check login input. Email is checked before password.
pub fn validate_login(input: &LoginInput) -> Result<(), ValidationError> {
    if input.email.is_empty() {
        return Err(ValidationError::EmptyEmail);
    }
    if input.password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    Ok(())
}

/// Check register input: password policy, then confirmation, then username,
/// then email presence.
pub fn validate_register(input: &RegisterInput) -> Result<(), ValidationError> {
    if !password_meets_policy(&input.password) {
        return Err(ValidationError::WeakPassword);
    }
    if input.password != input.confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if !username_is_acceptable(&input.username) {
        return Err(ValidationError::InvalidUsername);
    }
    if input.email.is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    Ok(())
}

fn password_meets_policy(password: &str) -> bool {
    let length = password.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&length) {
        return false;
    }
    if password.chars().any(char::is_whitespace) {
        return false;
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    // Whitespace was rejected above, so anything non-alphanumeric is special
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());
    has_lower && has_upper && has_digit && has_special
}

fn username_is_acceptable(username: &str) -> bool {
    username.chars().count() >= USERNAME_MIN_CHARS
        && username.chars().all(|c| c.is_ascii_alphanumeric())
}
