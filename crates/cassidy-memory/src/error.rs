use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory bank must be a JSON object")]
    InvalidBankShape,

    #[error("memory bank I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("memory bank is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
