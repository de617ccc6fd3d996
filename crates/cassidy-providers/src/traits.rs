//! Upstream client trait

use async_trait::async_trait;
use serde_json::Value;

use crate::ProviderError;

/// Result type for upstream operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Extracted generation output.
///
/// `text` is `None` when the upstream reply carried no usable text part;
/// callers decide what fallback to substitute.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub text: Option<String>,
}

/// Trait for upstream clients. One HTTP POST per call, no retries.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// POST a client-supplied JSON body to the provider's generation
    /// endpoint unchanged and return the parsed reply.
    async fn forward(&self, body: &Value) -> ProviderResult<Value>;

    /// Single-turn generation from a prepared prompt, with an optional
    /// system/persona instruction.
    async fn generate(&self, prompt: &str, system: Option<&str>) -> ProviderResult<Generation>;

    /// Multimodal generation combining a textual instruction with one
    /// inline base64 image.
    async fn generate_vision(
        &self,
        instruction: &str,
        mime_type: &str,
        image_base64: &str,
    ) -> ProviderResult<Generation>;

    /// Get the provider name
    fn provider(&self) -> &str;
}
