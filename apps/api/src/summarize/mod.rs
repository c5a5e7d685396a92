// Summarization pipeline.
// Implements: input validation, file text extraction, prompt construction, and
// the HTTP handlers that chain them into the completion dispatcher.
// All provider calls go through llm_client; no direct HTTP calls here.

pub mod extract;
pub mod handlers;
pub mod prompts;
pub mod validation;
