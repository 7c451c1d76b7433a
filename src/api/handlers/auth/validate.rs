//! Field validation for registration input.

use super::types::FieldError;
use regex::Regex;

/// Basic email format check.
pub(super) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Validate registration input before any storage access.
/// Returns an ordered list of field errors; empty means valid.
pub(super) fn validate_register(username: &str, email: &str, password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if !valid_email(email) {
        errors.push(FieldError::new("email", "invalid email"));
    }

    if username.chars().count() <= 2 {
        errors.push(FieldError::new("username", "length must be greater than 2"));
    }

    if username.contains('@') {
        errors.push(FieldError::new("username", "cannot include an @"));
    }

    if password.chars().count() <= 6 {
        errors.push(FieldError::new("password", "length must be greater than 6"));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_input_has_no_errors() {
        assert!(validate_register("alice", "a@x.com", "secret1").is_empty());
    }

    #[test]
    fn short_username_is_rejected() {
        let errors = validate_register("al", "a@x.com", "secret1");
        assert_eq!(
            errors,
            vec![FieldError::new("username", "length must be greater than 2")]
        );
    }

    #[test]
    fn username_with_at_sign_is_rejected() {
        let errors = validate_register("a@lice", "a@x.com", "secret1");
        assert_eq!(
            errors,
            vec![FieldError::new("username", "cannot include an @")]
        );
    }

    #[test]
    fn password_boundary_is_strictly_greater_than_six() {
        // Six characters fail, seven pass.
        let errors = validate_register("alice", "a@x.com", "abc123");
        assert_eq!(
            errors,
            vec![FieldError::new("password", "length must be greater than 6")]
        );
        assert!(validate_register("alice", "a@x.com", "abcdefg").is_empty());
    }

    #[test]
    fn errors_accumulate_in_field_order() {
        let errors = validate_register("a@", "bad", "short");
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "username", "username", "password"]);
    }
}
