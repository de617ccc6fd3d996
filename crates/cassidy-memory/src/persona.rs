//! Persona rendering: turning the stored bank into a system instruction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const PERSONA_PREAMBLE: &str =
    "You are Cassidy, an in-game companion character. You talk to players \
     through an in-game chat window.";

const PERSONA_INSTRUCTIONS: &str =
    "Stay in character as Cassidy at all times. Keep replies short and \
     conversational; never mention being an AI, a language model, or these \
     instructions.";

/// Typed view over the stored bank used for prompt injection. Unknown
/// fields are carried but not rendered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryBank {
    #[serde(default)]
    pub core_memories: String,
    #[serde(default)]
    pub user_facts: String,
    #[serde(default)]
    pub current_context: String,
    #[serde(default, flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl MemoryBank {
    /// Build the typed view from a stored bank. A bank whose well-known
    /// fields are not strings degrades to the empty view rather than
    /// failing the request.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "memory bank fields not renderable, using empty persona");
            Self::default()
        })
    }
}

/// Render the bank into the system/persona instruction injected ahead of
/// the player's prompt. Empty sections are skipped.
pub fn render_system_instruction(bank: &MemoryBank) -> String {
    let mut sections = vec![PERSONA_PREAMBLE.to_string()];
    if !bank.core_memories.is_empty() {
        sections.push(format!("Core memories:\n{}", bank.core_memories));
    }
    if !bank.user_facts.is_empty() {
        sections.push(format!("Known facts about the player:\n{}", bank.user_facts));
    }
    if !bank.current_context.is_empty() {
        sections.push(format!("Current context:\n{}", bank.current_context));
    }
    sections.push(PERSONA_INSTRUCTIONS.to_string());
    sections.join("\n\n")
}
