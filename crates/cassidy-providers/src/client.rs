//! Upstream client builder

use std::sync::Arc;

use crate::{GeminiClient, OpenRouterClient, ProviderConfig, ProviderError, Upstream};

/// Builder for creating upstream clients
pub struct UpstreamClientBuilder {
    config: Option<ProviderConfig>,
}

impl UpstreamClientBuilder {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<Arc<dyn crate::UpstreamClient>, ProviderError> {
        let config = self
            .config
            .ok_or_else(|| ProviderError::Configuration("provider config required".into()))?;

        match config.upstream {
            Upstream::OpenRouter => Ok(Arc::new(OpenRouterClient::new(config)?)),
            Upstream::Gemini => Ok(Arc::new(GeminiClient::new(config)?)),
        }
    }
}

impl Default for UpstreamClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
