//! Cassidy Providers - upstream LLM client implementations
//!
//! This crate provides a unified interface for the two upstreams the relay
//! can be deployed against:
//! - OpenRouter (OpenAI-compatible `chat/completions`)
//! - Google Gemini (`generateContent`)

mod client;
mod config;
mod error;
mod gemini;
mod openrouter;
mod traits;
mod types;

pub use client::UpstreamClientBuilder;
pub use config::{ProviderConfig, Upstream};
pub use error::ProviderError;
pub use gemini::GeminiClient;
pub use openrouter::OpenRouterClient;
pub use secrecy::SecretString;
pub use traits::{Generation, ProviderResult, UpstreamClient};
pub use types::{ChatMessage, ChatRequest, Role, VisionRequest, DEFAULT_VISION_INSTRUCTION};
