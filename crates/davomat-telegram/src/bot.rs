//! Main Telegram bot implementation.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use crate::error::{Result, TelegramError};
use crate::handlers::{handle_message, Command};
use crate::state::BotState;

/// Environment variable holding the bot token.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// The Davomat Telegram bot.
pub struct DavomatBot {
    bot: Bot,
    state: Arc<BotState>,
}

impl DavomatBot {
    /// Create a new bot over `state`.
    ///
    /// Requires `TELEGRAM_BOT_TOKEN` environment variable to be set.
    pub fn new(state: Arc<BotState>) -> Result<Self> {
        let token = std::env::var(BOT_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(TelegramError::NoToken)?;

        Ok(Self {
            bot: Bot::new(token),
            state,
        })
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Start the bot in long-polling mode. Returns on Ctrl+C.
    pub async fn start_polling(&self) -> Result<()> {
        info!("Starting Telegram bot in polling mode...");

        if self.state.allowed_count() == 0 {
            warn!("TELEGRAM_ALLOWED_USERS is empty; every user will be refused");
        }

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "Could not register the command list");
        }

        let bot_name = Arc::new(self.get_me().await?);
        info!(bot = %bot_name, "Connected to Telegram");

        let bot = self.bot.clone();
        let state = Arc::clone(&self.state);

        // One branch for every message: commands are parsed after the
        // allow-list check and never while a password is awaited.
        let handler = dptree::entry().branch(Update::filter_message().endpoint(
            move |bot: Bot, msg: Message| {
                let state = Arc::clone(&state);
                let bot_name = Arc::clone(&bot_name);
                debug!(chat_id = %msg.chat.id, "Message received");
                async move { handle_message(bot, msg, state, bot_name).await }
            },
        ));

        info!("Bot is running! Send /start to begin.");

        Dispatcher::builder(bot, handler)
            .default_handler(|upd| async move {
                warn!(update_id = ?upd.id, "Unhandled update");
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}
