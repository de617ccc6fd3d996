//! Whole-document JSON storage for the memory bank.

use serde_json::{json, Value};
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::MemoryError;

const DEFAULT_CORE_MEMORIES: &str =
    "Cassidy is a witty, warm-hearted companion who lives in the game world \
     and looks out for the crew.";

/// The bank written on first run when no backing file exists.
pub fn default_bank() -> Value {
    json!({
        "core_memories": DEFAULT_CORE_MEMORIES,
        "user_facts": "",
        "current_context": "",
    })
}

/// File-backed memory bank storage.
///
/// The bank is stored and returned as the exact JSON object supplied:
/// `replace` is a full overwrite, never a merge, and no schema is enforced
/// on field names.
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location for the bank file.
    ///
    /// Prefers `~/.cassidy` for consistency with other CLI tools, falls
    /// back to the XDG data dir for environments where HOME is unset.
    pub fn default_path() -> io::Result<PathBuf> {
        let base_dir = dirs::home_dir()
            .map(|h| h.join(".cassidy"))
            .or_else(|| dirs::data_dir().map(|d| d.join("cassidy")))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "No home or data dir"))?;
        Ok(base_dir.join("memory_bank.json"))
    }

    /// Current bank. If the backing file is absent, writes the defaults
    /// and returns them.
    pub fn load(&self) -> Result<Value, MemoryError> {
        if !self.path.exists() {
            let bank = default_bank();
            self.write_atomic(&bank)?;
            tracing::info!(path = %self.path.display(), "initialized memory bank with defaults");
            return Ok(bank);
        }

        let content = fs::read_to_string(&self.path)?;
        let bank = serde_json::from_str(&content)?;
        Ok(bank)
    }

    /// Fully overwrite the stored bank and return the stored value.
    /// Rejects anything that is not a JSON object.
    pub fn replace(&self, bank: Value) -> Result<Value, MemoryError> {
        if !bank.is_object() {
            return Err(MemoryError::InvalidBankShape);
        }
        self.write_atomic(&bank)?;
        Ok(bank)
    }

    // Temp-file + rename so a crash mid-write never leaves a torn bank.
    fn write_atomic(&self, bank: &Value) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(bank)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
