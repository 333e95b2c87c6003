//! Error types for the blocklist combiner.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CombinerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Response too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<std::io::Error> for CombinerError {
    fn from(e: std::io::Error) -> Self {
        CombinerError::FileSystem(e.to_string())
    }
}
