use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountsError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Invalid secret: {0}")]
    InvalidSecret(String),
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Corrupt account state: {0}")]
    CorruptState(String),
    #[error("Encryption error: {0}")]
    Crypto(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No tokio runtime available to schedule persistence")]
    RuntimeUnavailable,
}
