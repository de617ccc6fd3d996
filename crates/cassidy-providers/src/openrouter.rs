//! OpenRouter client implementation
//!
//! OpenRouter speaks the OpenAI `chat/completions` schema, so pass-through
//! deployments forward the client body unchanged and hand the upstream
//! envelope straight back.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::{
    traits::Generation, traits::ProviderResult, ProviderConfig, ProviderError, UpstreamClient,
};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api";

/// OpenRouter API client
pub struct OpenRouterClient {
    client: Client,
    config: ProviderConfig,
}

impl OpenRouterClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", config.api_key.expose_secret())
                .parse()
                .map_err(|_| ProviderError::Configuration("Invalid API key format".into()))?,
        );
        headers.insert("content-type", "application/json".parse().unwrap());

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url_trimmed(DEFAULT_BASE_URL)
        )
    }

    fn build_generate_request(&self, prompt: &str, system: Option<&str>) -> CompletionRequest {
        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(CompletionMessage {
                role: "system",
                content: MessageContent::Text(system.to_string()),
            });
        }
        messages.push(CompletionMessage {
            role: "user",
            content: MessageContent::Text(prompt.to_string()),
        });
        self.request_with(messages)
    }

    fn build_vision_request(
        &self,
        instruction: &str,
        mime_type: &str,
        image_base64: &str,
    ) -> CompletionRequest {
        let parts = vec![
            ContentPart::Text {
                text: instruction.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:{};base64,{}", mime_type, image_base64),
                },
            },
        ];
        self.request_with(vec![CompletionMessage {
            role: "user",
            content: MessageContent::Parts(parts),
        }])
    }

    fn request_with(&self, messages: Vec<CompletionMessage>) -> CompletionRequest {
        CompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_output_tokens,
        }
    }

    async fn post(&self, body: &impl Serialize) -> ProviderResult<reqwest::Response> {
        let url = self.completions_url();
        tracing::debug!(%url, model = %self.config.model, "openrouter request");
        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::UpstreamStatus { status, body });
        }
        Ok(response)
    }

    fn extract_text(response: CompletionResponse) -> Option<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.is_empty())
    }
}

#[async_trait]
impl UpstreamClient for OpenRouterClient {
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
        let api_response: CompletionResponse = response
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
        let api_response: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(Generation {
            text: Self::extract_text(api_response),
        })
    }

    fn provider(&self) -> &str {
        "openrouter"
    }
}

// API request/response types
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<CompletionMessage>,
    temperature: f64,
    top_p: f64,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct CompletionMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
