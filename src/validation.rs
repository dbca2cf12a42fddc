use regex::Regex;

use crate::error::{field_error, ApiError, FieldError};

/// Minimum trimmed length for post titles and bodies.
pub const MIN_FIELD_LEN: usize = 5;
/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LEN: usize = 5;

pub fn looks_like_email(email: &str) -> bool {
    let re = Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").unwrap();
    re.is_match(email)
}

/// Title/content checks shared by create and update. Both fields are
/// reported in one 422 so the client can surface every problem at once.
pub fn validate_post_input(title: &str, content: &str) -> Result<(), ApiError> {
    let mut errors: Vec<FieldError> = Vec::new();

    if title.trim().chars().count() < MIN_FIELD_LEN {
        errors.push(field_error("title", "Title must be at least 5 characters long."));
    }
    if content.trim().chars().count() < MIN_FIELD_LEN {
        errors.push(field_error(
            "content",
            "Content must be at least 5 characters long.",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

pub fn validate_signup(email: &str, password: &str, name: &str) -> Result<(), ApiError> {
    let mut errors: Vec<FieldError> = Vec::new();

    if !looks_like_email(email) {
        errors.push(field_error("email", "Please enter a valid e-mail address."));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(field_error(
            "password",
            "Password must be at least 5 characters long.",
        ));
    }
    if name.trim().is_empty() {
        errors.push(field_error("name", "Name must not be empty."));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(looks_like_email("ada@example.com"));
        assert!(looks_like_email("first.last+tag@sub.example.co"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!looks_like_email("not-an-email"));
        assert!(!looks_like_email("missing@tld"));
        assert!(!looks_like_email("@example.com"));
    }

    #[test]
    fn post_input_is_trimmed_before_the_length_check() {
        // 4 chars surrounded by whitespace must not pass
        let err = validate_post_input("  abcd  ", "valid content").unwrap_err();
        match err {
            ApiError::Validation(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "title");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn both_short_fields_are_reported_together() {
        let err = validate_post_input("ab", "cd").unwrap_err();
        match err {
            ApiError::Validation(details) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "content"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn five_trimmed_chars_are_enough() {
        assert!(validate_post_input(" abcde ", "12345").is_ok());
    }

    #[test]
    fn signup_collects_every_bad_field() {
        let err = validate_signup("nope", "abc", "  ").unwrap_err();
        match err {
            ApiError::Validation(details) => assert_eq!(details.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
