//! Error types for the Telegram bot.

use davomat_core::{ConfigError, ErpError};
use davomat_persistence::{CipherError, PersistenceError};
use thiserror::Error;

/// Errors that stop the bot from starting.
///
/// Failures while serving a chat are answered in the chat and never surface
/// here.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential key error: {0}")]
    Cipher(#[from] CipherError),

    #[error("Credential store error: {0}")]
    Store(#[from] PersistenceError),

    #[error("ERP client error: {0}")]
    Erp(#[from] ErpError),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;
