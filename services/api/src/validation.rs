//! Form checks that run before anything reaches the database

use crate::error::ApiError;

fn invalid(message: &str) -> ApiError {
    ApiError::Validation(message.to_string())
}

/// Trimmed value, or an error when it is blank
pub fn required<'a>(value: &'a str, message: &str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(message));
    }
    Ok(value)
}

/// Trimmed value, or an error when it is shorter than `min` characters
pub fn min_chars<'a>(value: &'a str, min: usize, message: &str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.chars().count() < min {
        return Err(invalid(message));
    }
    Ok(value)
}

/// Trimmed optional text, with blanks treated as absent
pub fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Encouragement ratings are whole stars from 1 to 5
pub fn rating(value: i64) -> Result<i16, ApiError> {
    match value {
        1..=5 => Ok(value as i16),
        _ => Err(invalid("Rating must be between 1 and 5")),
    }
}

/// Digits with an optional leading `+`, 7 to 15 digits long
pub fn phone(value: &str) -> Result<&str, ApiError> {
    let value = value.trim();
    let digits = value.strip_prefix('+').unwrap_or(value);
    if !(7..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("Please enter a valid phone number"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        for value in 1..=5 {
            assert_eq!(rating(value).unwrap(), value as i16);
        }
        for value in [0, 6, -1, i64::MAX, i64::MIN] {
            assert!(rating(value).is_err());
        }
    }

    #[test]
    fn test_text_helpers() {
        assert_eq!(required("  Sitabuldi ", "x").unwrap(), "Sitabuldi");
        assert!(required("   ", "x").is_err());
        assert!(min_chars("ab", 3, "x").is_err());
        assert_eq!(min_chars(" abc ", 3, "x").unwrap(), "abc");
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" note ")), Some("note"));
    }

    #[test]
    fn test_phone() {
        assert!(phone("+919876543210").is_ok());
        assert!(phone("0712-254").is_err());
        assert!(phone("12345").is_err());
    }
}
