//! Client-facing reply envelopes and fallback strings.
//!
//! When extraction finds no text in the upstream reply, the route
//! substitutes a fixed in-character line instead of failing: the character
//! should never break on stage.

use serde_json::{json, Value};

pub const CHAT_FALLBACK: &str = "Hmm, I lost my train of thought there. Say that again?";
pub const VISION_FALLBACK: &str = "I can't quite make out that picture right now.";

/// Which envelope flatten-mode chat replies are wrapped in, promised per
/// deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyEnvelope {
    /// `{"reply": text}`
    Flat,
    /// `{"choices":[{"message":{"role":"assistant","content": text}}]}`
    OpenAi,
}

pub fn chat_reply(envelope: ReplyEnvelope, text: &str) -> Value {
    match envelope {
        ReplyEnvelope::Flat => json!({ "reply": text }),
        ReplyEnvelope::OpenAi => json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        }),
    }
}

pub fn vision_reply(text: &str) -> Value {
    json!({ "vision": text })
}
