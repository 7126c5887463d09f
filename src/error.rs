use thiserror::Error;

pub type TldResult<T> = Result<T, TldError>;

#[derive(Error, Debug, Clone)]
pub enum TldError {
    #[error("Invalid account identifier: {0}")]
    InvalidAccountIdentifier(String),

    #[error("Invalid domain format: {0}")]
    InvalidDomain(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Solana RPC error: {0}")]
    RpcError(String),

    #[error("NFT metadata error: {0}")]
    MetadataError(String),

    #[error("Address derivation failed: {0}")]
    DerivationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<reqwest::Error> for TldError {
    fn from(err: reqwest::Error) -> Self {
        TldError::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for TldError {
    fn from(err: serde_json::Error) -> Self {
        TldError::DecodeError(err.to_string())
    }
}

impl From<base64::DecodeError> for TldError {
    fn from(err: base64::DecodeError) -> Self {
        TldError::DecodeError(format!("Base64 decode error: {}", err))
    }
}

impl From<bs58::decode::Error> for TldError {
    fn from(err: bs58::decode::Error) -> Self {
        TldError::InvalidAccountIdentifier(err.to_string())
    }
}
