/// Input validators
///
/// Checks run before any storage or crypto work:
/// - registration username: ASCII letters and digits, 3 to 30 characters
/// - registration password: 8 to 128 characters
/// - login credentials and refresh tokens: present and non-empty

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 30;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9]+$").unwrap();
}

/// Validates a username for registration.
pub fn is_valid_username(username: Option<&str>) -> Result<String, ValidationError> {
    let username = required("username", username)?;
    let length = username.chars().count();

    if length < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort("username".to_string(), MIN_USERNAME_LENGTH));
    }
    if length > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username".to_string(), MAX_USERNAME_LENGTH));
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidFormat(
            "username must only contain alpha-numeric characters".to_string(),
        ));
    }

    Ok(username.to_string())
}

/// Validates a password for registration. Length is counted in characters.
pub fn is_valid_password(password: Option<&str>) -> Result<String, ValidationError> {
    let password = required("password", password)?;
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password".to_string(), MIN_PASSWORD_LENGTH));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_LENGTH));
    }

    Ok(password.to_string())
}

/// A required, non-empty string field. Content is not otherwise checked.
pub fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::EmptyField(field.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_username() {
        assert_eq!(is_valid_username(Some("alice")).unwrap(), "alice");
        assert!(is_valid_username(Some("Bob123")).is_ok());
        assert!(is_valid_username(Some("abc")).is_ok());
        assert!(is_valid_username(Some(&"a".repeat(30))).is_ok());
    }

    #[test]
    fn test_username_length_limits() {
        assert_eq!(
            is_valid_username(Some("ab")),
            Err(ValidationError::TooShort("username".to_string(), 3))
        );
        assert_eq!(
            is_valid_username(Some(&"a".repeat(31))),
            Err(ValidationError::TooLong("username".to_string(), 30))
        );
    }

    #[test]
    fn test_username_must_be_alphanumeric() {
        for bad in ["alice_b", "alice b", "alice-b", "al!ce", "ålice", "alice'--"] {
            assert!(is_valid_username(Some(bad)).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_missing_username() {
        assert!(matches!(is_valid_username(None), Err(ValidationError::EmptyField(_))));
        assert!(matches!(is_valid_username(Some("")), Err(ValidationError::EmptyField(_))));
    }

    #[test]
    fn test_password_length_limits() {
        assert!(is_valid_password(Some("Password1")).is_ok());
        assert!(is_valid_password(Some("12345678")).is_ok());
        assert!(is_valid_password(Some(&"p".repeat(128))).is_ok());

        assert!(is_valid_password(Some("short")).is_err());
        assert!(is_valid_password(Some(&"p".repeat(129))).is_err());
    }

    #[test]
    fn test_password_counts_characters_not_bytes() {
        // 8 characters, 16 bytes
        assert!(is_valid_password(Some("éééééééé")).is_ok());
    }

    #[test]
    fn test_missing_password() {
        assert!(is_valid_password(None).is_err());
        assert!(is_valid_password(Some("")).is_err());
    }

    #[test]
    fn test_required() {
        assert_eq!(required("token", Some("abc")).unwrap(), "abc");
        assert!(required("token", Some("")).is_err());
        assert!(required("token", None).is_err());
    }
}
