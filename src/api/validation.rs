//! Input validation for API requests.
//!
//! Validators return `Result<_, String>` with a human-readable message; handlers
//! collect them into an `ApiError` with `ValidationErrorBuilder`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::db::{CefrLevel, WordDraft, WordRequest};

use super::error::{ApiError, ValidationErrorBuilder};

lazy_static! {
    /// Pragmatic email check: something@something.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

const MAX_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254;
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_WORD_LENGTH: usize = 200;
const MAX_MEANING_LENGTH: usize = 1000;
const MAX_EXAMPLE_LENGTH: usize = 2000;

/// Trim a required text field and check it is present and within bounds
pub fn validate_required_text(
    value: Option<&str>,
    label: &str,
    max_len: usize,
) -> Result<String, String> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(format!("{} is required", label));
    }
    if trimmed.chars().count() > max_len {
        return Err(format!("{} is too long (max {} characters)", label, max_len));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank collapses to `None`
pub fn validate_optional_text(
    value: Option<&str>,
    label: &str,
    max_len: usize,
) -> Result<Option<String>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > max_len => Err(format!(
            "{} is too long (max {} characters)",
            label, max_len
        )),
        Some(text) => Ok(Some(text.to_string())),
    }
}

/// Parse an optional level; omitted defaults to A1
pub fn validate_level(level: Option<&str>) -> Result<CefrLevel, String> {
    match level {
        None => Ok(CefrLevel::default()),
        Some(raw) => raw.parse().map_err(|e: crate::db::ParseLevelError| e.to_string()),
    }
}

pub fn validate_name(name: Option<&str>) -> Result<String, String> {
    validate_required_text(name, "Name", MAX_NAME_LENGTH)
}

pub fn validate_email(email: Option<&str>) -> Result<String, String> {
    let email = email.map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err("Email is too long".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Please provide a valid email".to_string());
    }
    Ok(email.to_lowercase())
}

pub fn validate_password(password: Option<&str>) -> Result<String, String> {
    let password = password.unwrap_or_default();
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password is too long (max {} characters)",
            MAX_PASSWORD_LENGTH
        ));
    }
    if !password.chars().any(char::is_alphabetic) {
        return Err("Password must contain at least one letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number".to_string());
    }
    Ok(password.to_string())
}

/// Validate every field of a word payload and build the draft to persist.
///
/// Used for both create and update: updates are full replacements and get no
/// partial-validation shortcut.
pub fn validate_word_request(req: &WordRequest) -> Result<WordDraft, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    let word = match validate_required_text(req.word.as_deref(), "Word", MAX_WORD_LENGTH) {
        Ok(word) => word,
        Err(e) => {
            errors.add("word", e);
            String::new()
        }
    };

    let meaning =
        match validate_required_text(req.meaning.as_deref(), "Meaning", MAX_MEANING_LENGTH) {
            Ok(meaning) => meaning,
            Err(e) => {
                errors.add("meaning", e);
                String::new()
            }
        };

    let example =
        match validate_optional_text(req.example.as_deref(), "Example", MAX_EXAMPLE_LENGTH) {
            Ok(example) => example,
            Err(e) => {
                errors.add("example", e);
                None
            }
        };

    let level = match validate_level(req.level.as_deref()) {
        Ok(level) => level,
        Err(e) => {
            errors.add("level", e);
            CefrLevel::default()
        }
    };

    errors.finish()?;

    Ok(WordDraft {
        word,
        meaning,
        example,
        level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(word: Option<&str>, meaning: Option<&str>) -> WordRequest {
        WordRequest {
            word: word.map(String::from),
            meaning: meaning.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_required_text() {
        assert_eq!(
            validate_required_text(Some("  hello "), "Word", 10),
            Ok("hello".to_string())
        );
        assert!(validate_required_text(Some("   "), "Word", 10).is_err());
        assert!(validate_required_text(None, "Word", 10).is_err());
        assert!(validate_required_text(Some("abcdefghijk"), "Word", 10).is_err());
    }

    #[test]
    fn test_validate_optional_text() {
        assert_eq!(validate_optional_text(None, "Example", 10), Ok(None));
        assert_eq!(validate_optional_text(Some("  "), "Example", 10), Ok(None));
        assert_eq!(
            validate_optional_text(Some(" hi "), "Example", 10),
            Ok(Some("hi".to_string()))
        );
    }

    #[test]
    fn test_validate_level() {
        assert_eq!(validate_level(None), Ok(CefrLevel::A1));
        assert_eq!(validate_level(Some("B2")), Ok(CefrLevel::B2));
        assert!(validate_level(Some("Z9")).is_err());
        assert!(validate_level(Some("")).is_err());
        assert!(validate_level(Some(" B1 ")).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email(Some(" Ada@Example.com ")),
            Ok("ada@example.com".to_string())
        );
        assert!(validate_email(Some("not-an-email")).is_err());
        assert!(validate_email(Some("a@b")).is_err());
        assert!(validate_email(Some("a b@c.de")).is_err());
        assert!(validate_email(None).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password(Some("secret1")).is_ok());
        assert!(validate_password(Some("short")).is_err());
        assert_eq!(
            validate_password(Some("abcdef")).unwrap_err(),
            "Password must contain at least one number"
        );
        assert_eq!(
            validate_password(Some("123456")).unwrap_err(),
            "Password must contain at least one letter"
        );
        assert!(validate_password(Some("")).is_err());
        assert!(validate_password(None).is_err());
    }

    #[test]
    fn test_word_request_defaults_level() {
        let draft = validate_word_request(&request(Some(" dog "), Some(" a pet "))).unwrap();
        assert_eq!(draft.word, "dog");
        assert_eq!(draft.meaning, "a pet");
        assert_eq!(draft.example, None);
        assert_eq!(draft.level, CefrLevel::A1);
    }

    #[test]
    fn test_word_request_reports_every_missing_field() {
        let err = validate_word_request(&request(Some(""), None)).unwrap_err();
        let details = err.details().unwrap();
        assert!(details.contains_key("word"));
        assert!(details.contains_key("meaning"));
    }

    #[test]
    fn test_word_request_rejects_unknown_level() {
        let mut req = request(Some("dog"), Some("a pet"));
        req.level = Some("D1".to_string());
        let err = validate_word_request(&req).unwrap_err();
        assert!(err.details().unwrap().contains_key("level"));
    }
}
