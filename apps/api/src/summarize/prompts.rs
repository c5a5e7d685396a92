// Prompt construction for summarization.
// The system instruction holds the fixed behavioral rules; the user
// instruction carries the per-request task framing and the input text.

/// System instruction sent with every summarization request.
pub const SUMMARY_SYSTEM: &str = "You are a helpful assistant that writes concise, faithful summaries. \
    Respect factual accuracy and do not invent details. \
    Never exceed the requested maximum number of words. \
    Do not copy the source verbatim: no unbroken quotation longer than 3 words. \
    Output only the summary, with no preamble, headings, or commentary. \
    Always compress the input, even when it is already short.";

/// The instruction pair handed to the completion dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Forced-language directive for recognized hint prefixes. Any other hint
/// leaves the language to the model (auto-detect).
fn language_directive(language: Option<&str>) -> Option<&'static str> {
    let hint = language?.to_lowercase();
    if hint.starts_with("da") {
        Some(" Write the summary in Danish (da).")
    } else if hint.starts_with("en") {
        Some(" Write the summary in English (en).")
    } else {
        None
    }
}

/// Builds the prompt. Deterministic: no clock, no randomness, no I/O.
pub fn build_prompt(
    text: &str,
    max_words: u32,
    language: Option<&str>,
    tone: Option<&str>,
) -> Prompt {
    let mut user = format!("Summarize the following text in at most {max_words} words.");
    if let Some(directive) = language_directive(language) {
        user.push_str(directive);
    }
    if let Some(tone) = tone.filter(|t| !t.is_empty()) {
        user.push_str(&format!(" Tone: {tone}."));
    }
    user.push_str("\n\n");
    user.push_str(text);

    Prompt {
        system: SUMMARY_SYSTEM.to_string(),
        user,
    }
}
