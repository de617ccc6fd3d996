//! Client-facing wire types.
//!
//! The Roblox game script speaks an OpenAI-style `messages` schema for chat
//! and a small custom shape for vision requests. Incoming bodies are
//! validated into these types before anything touches the upstream.

use serde::{Deserialize, Serialize};

/// Instruction used for vision requests that carry no `context` and no
/// trailing message.
pub const DEFAULT_VISION_INSTRUCTION: &str =
    "Describe what you see in this image, in character.";

const DEFAULT_IMAGE_MIME: &str = "image/png";

/// A message role in the client chat schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// An inbound chat request. `messages` must be a non-empty ordered array;
/// callers reject empty lists before forwarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Collapse the ordered message list into one prompt string. Each
    /// content is followed by a blank-line separator; role information is
    /// discarded.
    pub fn flatten(&self) -> String {
        let mut prompt = String::new();
        for msg in &self.messages {
            prompt.push_str(&msg.content);
            prompt.push_str("\n\n");
        }
        prompt
    }
}

/// An inbound vision request: one base64 image plus an optional textual
/// context or message history.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionRequest {
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl VisionRequest {
    /// The base64 payload, if present and non-empty.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|s| !s.is_empty())
    }

    /// Textual instruction for the multimodal call: explicit `context`,
    /// else the last message, else a fixed default.
    pub fn instruction(&self) -> &str {
        if let Some(context) = self.context.as_deref().filter(|s| !s.is_empty()) {
            return context;
        }
        self.messages
            .as_deref()
            .and_then(|msgs| msgs.last())
            .map(|m| m.content.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_VISION_INSTRUCTION)
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME)
    }
}
