use thiserror::Error;

/// Unified error type for the vault core.
///
/// `AuthFailure` carries no detail: a wrong password and a tampered
/// ciphertext must be indistinguishable to callers.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("authentication failed")]
    AuthFailure,

    #[error("malformed vault record: {0}")]
    Format(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("vault is locked; unlock with password first")]
    Locked,

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for VaultError {
    fn from(e: std::io::Error) -> Self {
        VaultError::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
