use anyhow::{Context, Result};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Read once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the completion provider. May be a dummy value for local
    /// OpenAI-compatible servers.
    pub openai_api_key: String,
    /// Alternate provider endpoint, e.g. `http://localhost:1234/v1` for LM Studio.
    pub openai_base_url: Option<String>,
    pub openai_model: String,
    /// Pre-shared key clients must send in `X-API-Key`. When unset every
    /// content-bearing request is rejected.
    pub service_api_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub provider_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: optional_env("OPENAI_BASE_URL"),
            openai_model: optional_env("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            service_api_key: optional_env("API_KEY"),
            cors_origins: parse_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into()),
            ),
            provider_timeout_secs: parse_env("PROVIDER_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            port: parse_env("PORT")?.unwrap_or(8080),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// True when neither a provider key nor an alternate endpoint is configured.
    /// Local compatible servers still expect some key value, but a base URL
    /// alone is accepted.
    pub fn provider_unconfigured(&self) -> bool {
        self.openai_api_key.is_empty() && self.openai_base_url.is_none()
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .ok()
            .map(Some)
            .with_context(|| format!("{key} must be a valid non-negative integer, got '{raw}'")),
        None => Ok(None),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
impl Config {
    /// Configuration used by handler and router tests.
    pub fn for_tests() -> Self {
        Config {
            openai_api_key: "sk-test".to_string(),
            openai_base_url: None,
            openai_model: "test-model".to_string(),
            service_api_key: Some("secret".to_string()),
            cors_origins: parse_origins(DEFAULT_CORS_ORIGINS),
            provider_timeout_secs: 5,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            port: 0,
            rust_log: "info".to_string(),
        }
    }
}
