//! Credential format rules.
//!
//! Logins are at least eight ASCII letters or digits. Passwords are at least
//! eight characters and mix upper case, lower case, digits and at least one
//! character that is neither a letter nor a digit.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::MIN_PASSWORD_LEN;
use crate::error::{Result, VaultError};

static LOGIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]{8,}$").expect("valid login regex"));
static UPPER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]").expect("valid upper-case regex"));
static LOWER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]").expect("valid lower-case regex"));
static DIGIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]").expect("valid digit regex"));
static SPECIAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("valid special-character regex"));

/// Returns true if `login` satisfies the login format.
pub fn is_valid_login(login: &str) -> bool {
    LOGIN_REGEX.is_match(login)
}

/// Returns true if `password` satisfies the strength rules.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && UPPER_REGEX.is_match(password)
        && LOWER_REGEX.is_match(password)
        && DIGIT_REGEX.is_match(password)
        && SPECIAL_REGEX.is_match(password)
}

/// Validates a login, failing with `InvalidInput`.
pub fn validate_login(login: &str) -> Result<()> {
    if is_valid_login(login) {
        Ok(())
    } else {
        Err(VaultError::invalid_input(
            "login must be at least 8 latin letters or digits",
        ))
    }
}

/// Validates a password, failing with `InvalidInput`.
pub fn validate_password(password: &str) -> Result<()> {
    if is_valid_password(password) {
        Ok(())
    } else {
        Err(VaultError::invalid_input(
            "password must be at least 8 characters with upper and lower case letters, a digit and a special character",
        ))
    }
}
