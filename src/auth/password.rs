/// Password hashing with bcrypt, plus strength validation.
use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash a password after checking strength requirements.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    validate_password_strength(password)?;

    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("password verification failed: {}", e)))
}

/// Requirements: 8-128 characters with at least one digit, one lowercase
/// and one uppercase letter. The upper bound also caps bcrypt input size.
fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        )));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "password must contain at least one digit, one lowercase letter, and one uppercase letter"
                .to_string(),
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_not_plaintext() {
        let password = "ValidPassword123";
        let hash = hash_password(password).expect("failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn correct_password_verifies() {
        let password = "ValidPassword123";
        let hash = hash_password(password).expect("failed to hash password");

        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hash = hash_password("ValidPassword123").expect("failed to hash password");

        assert!(!verify_password("WrongPassword123", &hash).unwrap());
    }

    #[test]
    fn weak_passwords_are_rejected() {
        let long_password = format!("{}A1", "a".repeat(MAX_PASSWORD_LENGTH));

        for weak in ["Short1", "nouppercase1", "NOLOWERCASE1", "NoDigitsHere", long_password.as_str()] {
            assert!(hash_password(weak).is_err(), "should reject: {}", weak);
        }
    }
}
