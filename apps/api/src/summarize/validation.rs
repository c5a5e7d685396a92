//! Input validation: enforces text and word-budget bounds before any provider call.

use crate::errors::AppError;
use crate::models::summary::SummarizeRequest;

pub const MIN_TEXT_CHARS: usize = 1;
pub const MAX_TEXT_CHARS: usize = 10_000;
pub const MIN_WORDS: u32 = 10;
pub const MAX_WORDS: u32 = 300;
pub const DEFAULT_MAX_WORDS: u32 = 120;

/// A request whose fields are known to be within bounds.
/// Only constructed through `validate`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub text: String,
    pub max_words: u32,
    pub language: Option<String>,
    pub tone: Option<String>,
}

/// Validates raw request fields. Character counts are Unicode scalar values.
pub fn validate(request: SummarizeRequest) -> Result<ValidatedRequest, AppError> {
    let chars = request.text.chars().count();
    if chars < MIN_TEXT_CHARS {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }
    if chars > MAX_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "text must be at most {MAX_TEXT_CHARS} characters"
        )));
    }

    let max_words = check_max_words(request.max_words)?;

    Ok(ValidatedRequest {
        text: request.text,
        max_words,
        language: normalize_hint(request.language),
        tone: normalize_hint(request.tone),
    })
}

/// Applies the default and range check for `max_words`.
pub fn check_max_words(max_words: Option<i64>) -> Result<u32, AppError> {
    let value = max_words.unwrap_or(i64::from(DEFAULT_MAX_WORDS));
    if value < i64::from(MIN_WORDS) || value > i64::from(MAX_WORDS) {
        return Err(AppError::Validation(format!(
            "max_words must be between {MIN_WORDS} and {MAX_WORDS}"
        )));
    }
    Ok(value as u32)
}

/// Parses `max_words` supplied as a form or query string.
pub fn parse_max_words(raw: Option<&str>) -> Result<u32, AppError> {
    let parsed = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Some(
            s.parse::<i64>()
                .map_err(|_| AppError::Validation("max_words must be an integer".to_string()))?,
        ),
        None => None,
    };
    check_max_words(parsed)
}

// Blank hints mean "no preference".
fn normalize_hint(hint: Option<String>) -> Option<String> {
    hint.map(|h| h.trim().to_string()).filter(|h| !h.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str, max_words: Option<i64>) -> SummarizeRequest {
        SummarizeRequest {
            text: text.to_string(),
            max_words,
            language: None,
            tone: None,
        }
    }

    #[test]
    fn test_accepts_bounds() {
        assert!(validate(request("a", Some(10))).is_ok());
        assert!(validate(request(&"x".repeat(MAX_TEXT_CHARS), Some(300))).is_ok());
    }

    #[test]
    fn test_rejects_empty_text() {
        let err = validate(request("", None)).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("text")));
    }

    #[test]
    fn test_rejects_overlong_text() {
        let err = validate(request(&"x".repeat(MAX_TEXT_CHARS + 1), None)).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("text")));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 10,000 two-byte characters is 20,000 bytes but still in bounds.
        let text = "æ".repeat(MAX_TEXT_CHARS);
        assert!(validate(request(&text, None)).is_ok());
    }

    #[test]
    fn test_max_words_default() {
        let validated = validate(request("hello", None)).unwrap();
        assert_eq!(validated.max_words, DEFAULT_MAX_WORDS);
    }

    #[test]
    fn test_max_words_out_of_range() {
        for bad in [9, 301, 0, -5] {
            let err = validate(request("hello", Some(bad))).unwrap_err();
            assert!(matches!(err, AppError::Validation(msg) if msg.contains("max_words")));
        }
    }

    #[test]
    fn test_blank_hints_become_none() {
        let validated = validate(SummarizeRequest {
            text: "hello".into(),
            max_words: None,
            language: Some("  ".into()),
            tone: Some(" formal ".into()),
        })
        .unwrap();
        assert_eq!(validated.language, None);
        assert_eq!(validated.tone.as_deref(), Some("formal"));
    }

    #[test]
    fn test_parse_max_words() {
        assert_eq!(parse_max_words(None).unwrap(), DEFAULT_MAX_WORDS);
        assert_eq!(parse_max_words(Some("")).unwrap(), DEFAULT_MAX_WORDS);
        assert_eq!(parse_max_words(Some(" 42 ")).unwrap(), 42);
        assert!(parse_max_words(Some("many")).is_err());
        assert!(parse_max_words(Some("500")).is_err());
    }
}
