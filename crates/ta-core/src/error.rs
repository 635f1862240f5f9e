use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("File too large: {path} ({size_mb} MB, limit {limit_mb} MB)")]
    FileTooLarge {
        path: String,
        size_mb: u64,
        limit_mb: u64,
    },

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Unknown redaction category: {0}")]
    UnknownCategory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
