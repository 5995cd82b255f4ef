//! Error taxonomy for token lifecycle and upstream calls.

use davomat_persistence::{CipherError, PersistenceError};
use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, ErpError>;

/// Errors surfaced to the front-ends.
#[derive(Debug, Error)]
pub enum ErpError {
    /// No stored record for the identity.
    #[error("not logged in")]
    NotAuthenticated,

    /// Stored password is missing or cannot be decrypted.
    #[error("stored credentials are unavailable; log in again")]
    CredentialsUnavailable,

    /// Upstream rejected the stored credentials during a silent re-login.
    #[error("automatic re-login failed: {0}")]
    ReauthenticationFailed(String),

    /// Upstream rejected a fresh interactive login.
    #[error("login rejected by ERP: {0}")]
    UpstreamAuthFailed(String),

    /// Network failure, timeout, non-2xx status, or unusable body.
    #[error("ERP unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Invalid local configuration (bad base URL, unusable TLS setup).
    #[error("configuration error: {0}")]
    Config(String),

    /// The local password cipher could not seal a password.
    #[error("password encryption failed: {0}")]
    Cipher(CipherError),

    /// Local persistence failure.
    #[error("credential store error: {0}")]
    Store(#[from] PersistenceError),
}

impl From<CipherError> for ErpError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::Decryption(_) => ErpError::CredentialsUnavailable,
            CipherError::InvalidKey(_) | CipherError::Encryption => ErpError::Cipher(e),
        }
    }
}

impl From<reqwest::Error> for ErpError {
    fn from(e: reqwest::Error) -> Self {
        let reason = if e.is_timeout() {
            "request timed out".to_string()
        } else if e.is_connect() {
            "connection failed".to_string()
        } else if e.is_decode() {
            format!("malformed response: {}", e)
        } else {
            e.to_string()
        };
        ErpError::UpstreamUnavailable(reason)
    }
}

impl ErpError {
    /// Whether the caller has to log in interactively to recover.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ErpError::NotAuthenticated
                | ErpError::CredentialsUnavailable
                | ErpError::ReauthenticationFailed(_)
        )
    }
}
