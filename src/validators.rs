/// Input validation for the account fields the auth flows accept.
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 256;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_full_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("full name".to_string()));
    }

    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong("full name".to_string(), MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat("full name".to_string()));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_emails() {
        for email in ["user@example.com", "a.b+c@sub.domain.org", "  padded@example.com  "] {
            assert!(is_valid_email(email).is_ok(), "should accept: {}", email);
        }
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(
            is_valid_email("  user@example.com ").unwrap(),
            "user@example.com"
        );
    }

    #[test]
    fn rejects_invalid_emails() {
        for email in ["", "notanemail", "user@", "@example.com", "user@@example.com"] {
            assert!(is_valid_email(email).is_err(), "should reject: {:?}", email);
        }
    }

    #[test]
    fn rejects_overlong_email() {
        let email = format!("{}@example.com", "a".repeat(MAX_EMAIL_LENGTH));
        assert!(is_valid_email(&email).is_err());
    }

    #[test]
    fn accepts_valid_full_name() {
        assert_eq!(is_valid_full_name(" John Doe ").unwrap(), "John Doe");
    }

    #[test]
    fn rejects_empty_and_control_characters_in_full_name() {
        assert!(is_valid_full_name("   ").is_err());
        assert!(is_valid_full_name("John\u{0000}Doe").is_err());
    }
}
