use thiserror::Error;

pub type Result<T> = std::result::Result<T, LotoError>;

#[derive(Error, Debug)]
pub enum LotoError {
    #[error("Ledger API error: {0}")]
    Ledger(String),

    #[error("Network connection error: {0}")]
    NetworkConnection(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Malformed ledger response: {0}")]
    MalformedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Encryption error: {0}")]
    Crypto(String),

    #[error("Storage error at {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LotoError {
    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn storage(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.display().to_string(),
            source,
        }
    }
}

// conversion from reqwest::Error
impl From<reqwest::Error> for LotoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LotoError::Timeout(err.to_string())
        } else if err.is_decode() {
            LotoError::MalformedResponse(err.to_string())
        } else {
            LotoError::NetworkConnection(err.to_string())
        }
    }
}
