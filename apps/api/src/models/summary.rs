use serde::{Deserialize, Serialize};

/// Body of `POST /summarize`. Bounds are enforced by
/// `summarize::validation::validate`, not by deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
    /// Maximum words in the summary (10–300, default 120).
    #[serde(default)]
    pub max_words: Option<i64>,
    /// Output language hint, e.g. "da" or "en". Omit to auto-detect.
    #[serde(default)]
    pub language: Option<String>,
    /// Free-form tone hint: "neutral", "formal", "casual", ...
    #[serde(default)]
    pub tone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
    pub words: usize,
    pub model: String,
}

impl SummarizeResponse {
    pub fn new(summary: String, model: &str) -> Self {
        let words = summary.split_whitespace().count();
        Self {
            summary,
            words,
            model: model.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_is_whitespace_tokens() {
        let response = SummarizeResponse::new("A fox  jumps\nover\tdogs.".to_string(), "m");
        assert_eq!(response.words, 5);
        assert_eq!(response.model, "m");
    }

    #[test]
    fn test_request_optional_fields() {
        let req: SummarizeRequest = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert_eq!(req.max_words, None);
        assert!(req.language.is_none() && req.tone.is_none());

        let req: SummarizeRequest =
            serde_json::from_str(r#"{"text": "hi", "max_words": 50, "language": "da"}"#).unwrap();
        assert_eq!(req.max_words, Some(50));
        assert_eq!(req.language.as_deref(), Some("da"));
    }
}
