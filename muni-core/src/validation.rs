//! Centralized validation for applicant contact fields
//!
//! This module provides a single source of truth for validation logic so the
//! same rules apply whether a record arrives from the web portal or from a
//! clerk-facing admin surface.

use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Lazy-loaded email validation regex
///
/// This regex validates email addresses according to a practical subset of RFC 5322.
/// It's loaded once at runtime and reused for all email validation operations.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

/// Lazy-loaded phone validation regex
///
/// Accepts an optional leading `+` followed by 7 to 15 digits, with spaces,
/// dashes, and parentheses tolerated as separators (E.164 with common
/// formatting).
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9][0-9 ().-]{5,18}[0-9]$").expect("Invalid phone regex pattern")
});

/// Validates an email address
///
/// # Returns
///
/// Returns `Ok(())` if the email is valid, or a `ValidationError::InvalidEmail` if invalid.
///
/// # Examples
///
/// ```rust
/// use muni_core::validation::validate_email;
///
/// assert!(validate_email("applicant@example.com").is_ok());
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField(
            "Email is required".to_string(),
        ));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(format!(
            "Invalid email format: {email}"
        )))
    }
}

/// Validates an applicant phone number
///
/// # Returns
///
/// Returns `Ok(())` if the phone number is plausible, or a
/// `ValidationError::InvalidPhone` if not. Numbers are stored as entered;
/// normalization is a presentation concern.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.is_empty() {
        return Err(ValidationError::MissingField(
            "Phone number is required".to_string(),
        ));
    }

    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err(ValidationError::InvalidPhone(format!(
            "Phone number must contain 7-15 digits: {phone}"
        )));
    }

    if PHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone(format!(
            "Invalid phone format: {phone}"
        )))
    }
}

/// Validates an applicant's full name
///
/// # Name Requirements
///
/// - Cannot be empty or whitespace only
/// - Maximum 100 characters
pub fn validate_full_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingField(
            "Full name is required".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(ValidationError::InvalidName(
            "Name must be no more than 100 characters long".to_string(),
        ));
    }

    Ok(())
}
