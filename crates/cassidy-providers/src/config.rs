//! Provider configuration

use secrecy::SecretString;

const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Which upstream API the relay is deployed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    OpenRouter,
    Gemini,
}

/// Configuration for an upstream client.
///
/// Generation parameters are static per deployment; clients cannot override
/// them through the relay.
#[derive(Clone)]
pub struct ProviderConfig {
    pub upstream: Upstream,
    pub api_key: SecretString,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_output_tokens: usize,
    pub timeout_seconds: u64,
}

impl ProviderConfig {
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new(Upstream::OpenRouter, api_key, DEFAULT_OPENROUTER_MODEL)
    }

    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self::new(Upstream::Gemini, api_key, DEFAULT_GEMINI_MODEL)
    }

    fn new(upstream: Upstream, api_key: impl Into<String>, model: &str) -> Self {
        Self {
            upstream,
            api_key: SecretString::from(api_key.into()),
            base_url: None,
            model: model.to_string(),
            temperature: 0.9,
            top_p: 0.95,
            max_output_tokens: 1024,
            timeout_seconds: 60,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url_trimmed(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }
}
