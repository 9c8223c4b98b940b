//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Please enter a valid email address".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

fn require_min(value: &str, min: usize, message: &str) -> Result<(), String> {
    if value.trim().chars().count() < min {
        return Err(message.to_string());
    }
    Ok(())
}

/// Fields of a registration form that need checking before an account exists
pub struct SignUpFields<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub address: &'a str,
}

/// Validate a registration form, reporting the first problem found
pub fn validate_sign_up(fields: &SignUpFields<'_>) -> Result<(), String> {
    require_min(fields.first_name, 2, "First name is required")?;
    require_min(fields.last_name, 2, "Last name is required")?;
    validate_email(fields.email)?;
    validate_password(fields.password)?;
    if fields.password != fields.confirm_password {
        return Err("Passwords don't match".to_string());
    }
    require_min(fields.address, 5, "Address is required")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_fields() -> SignUpFields<'static> {
        SignUpFields {
            email: "asha@example.com",
            password: "secret1",
            confirm_password: "secret1",
            first_name: "Asha",
            last_name: "Patil",
            address: "12 Civil Lines",
        }
    }

    #[test]
    fn test_valid_sign_up_passes() {
        assert!(validate_sign_up(&valid_fields()).is_ok());
    }

    #[test]
    fn test_password_mismatch_is_reported() {
        let fields = SignUpFields {
            confirm_password: "secret2",
            ..valid_fields()
        };
        assert_eq!(
            validate_sign_up(&fields),
            Err("Passwords don't match".to_string())
        );
    }

    #[test]
    fn test_short_fields_are_rejected() {
        let fields = SignUpFields {
            first_name: "A",
            ..valid_fields()
        };
        assert_eq!(
            validate_sign_up(&fields),
            Err("First name is required".to_string())
        );

        let fields = SignUpFields {
            address: "  ab  ",
            ..valid_fields()
        };
        assert_eq!(validate_sign_up(&fields), Err("Address is required".to_string()));
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("user@nagpur.gov.in").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password(&"a".repeat(129)).is_err());
    }
}
