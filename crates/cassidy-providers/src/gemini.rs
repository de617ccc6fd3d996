//! Google Gemini client implementation
//!
//! Gemini has no multi-turn chat schema the game client could speak, so
//! deployments against it run in flatten mode: the caller collapses the
//! message list into a single prompt and this client builds a one-shot
//! `generateContent` request. The API key travels as the `key` query
//! parameter, per Google's URL convention.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::{
    traits::Generation, traits::ProviderResult, ProviderConfig, ProviderError, UpstreamClient,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini API client
pub struct GeminiClient {
    client: Client,
    config: ProviderConfig,
}

impl GeminiClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url_trimmed(DEFAULT_BASE_URL),
            self.config.model,
        )
    }

    fn build_generate_request(&self, prompt: &str, system: Option<&str>) -> GeminiRequest {
        // Single-turn request: the persona instruction rides in front of the
        // prompt instead of a separate system channel.
        let text = match system {
            Some(system) => format!("{}\n\n{}", system, prompt),
            None => prompt.to_string(),
        };
        self.request_with(vec![GeminiPart::Text { text }])
    }

    fn build_vision_request(
        &self,
        instruction: &str,
        mime_type: &str,
        image_base64: &str,
    ) -> GeminiRequest {
        self.request_with(vec![
            GeminiPart::Text {
                text: instruction.to_string(),
            },
            GeminiPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: mime_type.to_string(),
                    data: image_base64.to_string(),
                },
            },
        ])
    }

    fn request_with(&self, parts: Vec<GeminiPart>) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }

    async fn post(&self, body: &impl Serialize) -> ProviderResult<reqwest::Response> {
        let url = self.generate_url();
        tracing::debug!(%url, "gemini request");
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.expose_secret())])
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::UpstreamStatus { status, body });
        }
        Ok(response)
    }

    fn extract_text(response: GeminiResponse) -> Option<String> {
        response
            .candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .find_map(|part| match part {
                GeminiPart::Text { text } if !text.is_empty() => Some(text),
                _ => None,
            })
    }
}

#[async_trait]
impl UpstreamClient for GeminiClient {
    async fn forward(&self, body: &Value) -> ProviderResult<Value> {
        let response = self.post(body).await?;
        let reply = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(reply)
    }

    async fn generate(&self, prompt: &str, system: Option<&str>) -> ProviderResult<Generation> {
        let request = self.build_generate_request(prompt, system);
        let response = self.post(&request).await?;
        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(Generation {
            text: Self::extract_text(api_response),
        })
    }

    async fn generate_vision(
        &self,
        instruction: &str,
        mime_type: &str,
        image_base64: &str,
    ) -> ProviderResult<Generation> {
        let request = self.build_vision_request(instruction, mime_type, image_base64);
        let response = self.post(&request).await?;
        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(Generation {
            text: Self::extract_text(api_response),
        })
    }

    fn provider(&self) -> &str {
        "gemini"
    }
}

// API request/response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f64,
    top_p: f64,
    max_output_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContentResponse,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}
