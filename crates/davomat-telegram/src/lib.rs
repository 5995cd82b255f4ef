//! Telegram bot interface for Davomat.
//!
//! Students log in once with their Acharya ERP username and password; the
//! bot keeps the password encrypted and silently re-authenticates when the
//! cached upstream token expires.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `CREDENTIAL_KEY`: base64 key used to encrypt stored passwords
//!
//! Optional:
//! - `TELEGRAM_ALLOWED_USERS`: comma-separated Telegram user ids (empty = nobody)
//! - `ERP_*`: upstream settings, see `davomat_core::config`
//!
//! # Commands
//!
//! - `/start` - Log in (language, username, password)
//! - `/help` - Show available commands
//! - `/today` - Today's timetable
//! - `/attendance` - Attendance per course
//! - `/me` - Profile with mentor
//! - `/lang` - Change language
//! - `/logout` - Forget stored credentials
//!
//! Every command except `/help` and `/start` is also on the reply keyboard,
//! in Uzbek and English.

pub mod bot;
pub mod error;
pub mod format;
pub mod handlers;
pub mod i18n;
pub mod keyboards;
pub mod state;

#[cfg(test)]
mod testing;

pub use bot::DavomatBot;
pub use error::{Result, TelegramError};
pub use handlers::{on_command, on_message, on_text, Command, Outcome, Reply};
pub use state::{parse_allowed_users, BotState, Conversation, ALLOWED_USERS_ENV};
