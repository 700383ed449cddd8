//! Account field validation
//!
//! Blank and length checks for the account record. Password length is not
//! checked here; the password hasher owns that rule.

/// Maximum length accepted for any free-text account field
pub const MAX_FIELD_LEN: usize = 255;

/// Validate a username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username cannot be blank".to_string());
    }
    if username.chars().count() > MAX_FIELD_LEN {
        return Err("Username too long".to_string());
    }
    Ok(())
}

/// Validate an email address
pub fn validate_email_address(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email address cannot be blank".to_string());
    }
    if email.chars().count() > MAX_FIELD_LEN {
        return Err("Email address too long".to_string());
    }
    Ok(())
}

/// Validate a first or last name
pub fn validate_name(field: &str, value: &str) -> Result<(), String> {
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(format!("{} too long", field));
    }
    Ok(())
}
