//! Command and message handlers for the Telegram bot.
//!
//! Each message is turned into an [`Outcome`] by [`on_message`] and then
//! delivered by [`handle_message`]. Only the delivery half talks to
//! Telegram. Message text is never logged.

use std::sync::Arc;

use chrono::Local;
use davomat_core::ErpError;
use davomat_models::{ExternalId, Language};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html::escape;
use tracing::{debug, error, info, warn};

use crate::format;
use crate::i18n::{parse_language, texts, Action, Texts};
use crate::keyboards::Keyboard;
use crate::state::{BotState, Conversation};

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Log in / Tizimga kirish")]
    Start,

    #[command(description = "Show help / Yordam")]
    Help,

    #[command(description = "Profile / Profil")]
    Me,

    #[command(description = "Today's classes / Bugungi darslar")]
    Today,

    #[command(description = "Attendance / Davomat")]
    Attendance,

    #[command(description = "Change language / Tilni o'zgartirish")]
    Lang,

    #[command(description = "Log out and forget credentials / Chiqish")]
    Logout,
}

/// One message to send back.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Reply {
    fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Keep,
        }
    }

    fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = keyboard;
        self
    }
}

/// Everything the bot does in answer to one update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub replies: Vec<Reply>,
    /// Remove the user's message from the chat (it held a password).
    pub delete_incoming: bool,
}

impl Outcome {
    fn reply(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            delete_incoming: false,
        }
    }

    fn text(text: impl Into<String>) -> Self {
        Self::reply(Reply::new(text))
    }
}

/// Decides the answer to any text from `user_id`.
///
/// During the password step the text is always the password, even when it
/// looks like a command. Otherwise known commands run and everything else,
/// unknown commands included, goes through the dialogue.
pub async fn on_message(state: &BotState, user_id: u64, text: &str, bot_name: &str) -> Outcome {
    if let Some(Conversation::Password { .. }) = state.conversation(user_id).await {
        return on_text(state, user_id, text).await;
    }
    match Command::parse(text, bot_name) {
        Ok(cmd) => {
            info!(user_id, ?cmd, "Command matched");
            on_command(state, user_id, cmd).await
        }
        Err(_) => on_text(state, user_id, text).await,
    }
}

/// Decides the answer to a command from `user_id`.
pub async fn on_command(state: &BotState, user_id: u64, cmd: Command) -> Outcome {
    match cmd {
        Command::Start => start(state, user_id).await,
        Command::Help => {
            let language = state.language_of(user_id).await;
            Outcome::text(texts(language).help)
        }
        Command::Me => run_action(state, user_id, Action::Profile).await,
        Command::Today => run_action(state, user_id, Action::Today).await,
        Command::Attendance => run_action(state, user_id, Action::Attendance).await,
        Command::Lang => run_action(state, user_id, Action::Language).await,
        Command::Logout => run_action(state, user_id, Action::Logout).await,
    }
}

/// Decides the answer to a plain text message from `user_id`.
pub async fn on_text(state: &BotState, user_id: u64, text: &str) -> Outcome {
    match state.conversation(user_id).await {
        Some(Conversation::ChooseLanguage) => match parse_language(text) {
            Some(language) => {
                state
                    .set_conversation(user_id, Conversation::Username { language })
                    .await;
                Outcome::reply(
                    Reply::new(texts(language).ask_username).with_keyboard(Keyboard::Remove),
                )
            }
            None => Outcome::reply(
                Reply::new(texts(Language::default()).choose_lang)
                    .with_keyboard(Keyboard::LanguagePicker),
            ),
        },
        Some(Conversation::Username { language }) => {
            let username = text.trim();
            let t = texts(language);
            if username.is_empty() {
                return Outcome::text(t.empty_input);
            }
            state
                .set_conversation(
                    user_id,
                    Conversation::Password {
                        language,
                        username: username.to_string(),
                    },
                )
                .await;
            Outcome::text(t.ask_password)
        }
        Some(Conversation::Password { language, username }) => {
            let mut outcome = finish_login(state, user_id, language, &username, text).await;
            outcome.delete_incoming = true;
            outcome
        }
        Some(Conversation::ChangeLanguage) => match parse_language(text) {
            Some(language) => change_language(state, user_id, language).await,
            None => Outcome::reply(
                Reply::new(texts(state.language_of(user_id).await).choose_lang)
                    .with_keyboard(Keyboard::LanguagePicker),
            ),
        },
        None => match Action::from_button(text) {
            Some(action) => run_action(state, user_id, action).await,
            None => {
                let language = state.language_of(user_id).await;
                Outcome::text(texts(language).unknown_input)
            }
        },
    }
}

async fn start(state: &BotState, user_id: u64) -> Outcome {
    let id = ExternalId::telegram(user_id);
    match state.service().tokens().record(&id).await {
        Ok(Some(record)) if record.is_token_valid() => {
            state.clear_conversation(user_id).await;
            let language = record.preferred_language;
            let mut text = texts(language).already_logged.to_string();
            if let Some(name) = record.display_name.as_deref().filter(|n| !n.is_empty()) {
                text.push_str(&format!("\n👤 {}", escape(name)));
            }
            if let Some(upstream_id) = record.upstream_user_id {
                text.push_str(&format!("\n🆔 <code>{}</code>", upstream_id));
            }
            Outcome::reply(Reply::new(text).with_keyboard(Keyboard::MainMenu(language)))
        }
        Ok(_) => {
            state.set_conversation(user_id, Conversation::ChooseLanguage).await;
            Outcome::reply(
                Reply::new(texts(Language::default()).choose_lang)
                    .with_keyboard(Keyboard::LanguagePicker),
            )
        }
        Err(e) => {
            error!(user_id, error = %e, "Could not read stored credentials");
            Outcome::text(format::error(texts(Language::default()), &e))
        }
    }
}

async fn finish_login(
    state: &BotState,
    user_id: u64,
    language: Language,
    username: &str,
    password: &str,
) -> Outcome {
    let t = texts(language);
    let checking = Reply::new(t.checking_login);
    let id = ExternalId::telegram(user_id);

    if password.is_empty() {
        return Outcome::text(t.empty_input);
    }

    let result = state
        .service()
        .tokens()
        .login_and_store(&id, username, password, Some(language))
        .await;

    let answer = match result {
        Ok(_) => {
            state.clear_conversation(user_id).await;
            Reply::new(t.login_success).with_keyboard(Keyboard::MainMenu(language))
        }
        Err(ErpError::UpstreamAuthFailed(reason)) => {
            info!(user_id, reason = %reason, "Chat login rejected");
            state
                .set_conversation(user_id, Conversation::Username { language })
                .await;
            Reply::new(t.login_fail)
        }
        Err(e) => {
            warn!(user_id, error = %e, "Chat login failed");
            state
                .set_conversation(user_id, Conversation::Username { language })
                .await;
            Reply::new(format!("{}\n\n{}", format::error(t, &e), t.ask_username))
        }
    };

    Outcome {
        replies: vec![checking, answer],
        delete_incoming: false,
    }
}

async fn change_language(state: &BotState, user_id: u64, language: Language) -> Outcome {
    state.clear_conversation(user_id).await;
    match state
        .service()
        .tokens()
        .set_language(&ExternalId::telegram(user_id), language)
        .await
    {
        Ok(_) => {
            let t = texts(language);
            Outcome::reply(Reply::new(t.language_set).with_keyboard(Keyboard::MainMenu(language)))
        }
        Err(e) => Outcome::text(format::error(texts(language), &e)),
    }
}

/// Runs a menu operation for a logged-in user.
async fn run_action(state: &BotState, user_id: u64, action: Action) -> Outcome {
    // A command or button abandons any unfinished dialogue.
    state.clear_conversation(user_id).await;

    let id = ExternalId::telegram(user_id);
    let language = state.language_of(user_id).await;
    let t = texts(language);
    let service = state.service();

    let result = match action {
        Action::Today => service
            .timetable(&id, Local::now().date_naive())
            .await
            .map(|r| with_refresh_notice(t, r.refreshed, format::timetable(t, &r.data))),
        Action::Attendance => service
            .attendance(&id, None)
            .await
            .map(|r| with_refresh_notice(t, r.refreshed, format::attendance(t, &r.data))),
        Action::Profile => match service.profile(&id).await {
            Ok(r) => {
                let mentor = service.mentor(&r.auid).await;
                let card = format::profile(t, &r.data, r.upstream_user_id, &r.auid, mentor.as_ref());
                Ok(with_refresh_notice(t, r.refreshed, card))
            }
            Err(e) => Err(e),
        },
        Action::Language => {
            return match service.tokens().record(&id).await {
                Ok(Some(_)) => {
                    state.set_conversation(user_id, Conversation::ChangeLanguage).await;
                    Outcome::reply(Reply::new(t.choose_lang).with_keyboard(Keyboard::LanguagePicker))
                }
                Ok(None) => Outcome::text(t.not_logged_in),
                Err(e) => Outcome::text(format::error(t, &e)),
            };
        }
        Action::Logout => {
            return match service.tokens().logout(&id).await {
                Ok(true) => Outcome::reply(Reply::new(t.logged_out).with_keyboard(Keyboard::Remove)),
                Ok(false) => Outcome::text(t.nothing_to_logout),
                Err(e) => Outcome::text(format::error(t, &e)),
            };
        }
    };

    match result {
        Ok(text) => Outcome::text(text),
        Err(e) if e.requires_login() => {
            info!(user_id, ?action, error = %e, "Operation needs a fresh login");
            Outcome::reply(Reply::new(format::error(t, &e)).with_keyboard(Keyboard::Remove))
        }
        Err(e) => {
            debug!(user_id, ?action, error = %e, "Operation failed");
            Outcome::text(format::error(t, &e))
        }
    }
}

fn with_refresh_notice(t: &Texts, refreshed: bool, body: String) -> String {
    if refreshed {
        format!("{}\n\n{}", t.token_refreshed, body)
    } else {
        body
    }
}

/// Sender of `msg` if allowed to use the bot. Answers denied users.
async fn authorized_sender(bot: &Bot, msg: &Message, state: &BotState) -> ResponseResult<Option<u64>> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(None);
    };
    let user_id = user.id.0;

    if !state.is_allowed(user_id) {
        warn!(user_id, chat_id = %msg.chat.id, "Rejected message from user not on the allow-list");
        bot.send_message(msg.chat.id, texts(Language::default()).access_denied)
            .await?;
        return Ok(None);
    }

    Ok(Some(user_id))
}

async fn deliver(bot: &Bot, msg: &Message, outcome: Outcome) -> ResponseResult<()> {
    if outcome.delete_incoming {
        if let Err(e) = bot.delete_message(msg.chat.id, msg.id).await {
            warn!(chat_id = %msg.chat.id, error = %e, "Could not delete password message");
        }
    }

    for reply in outcome.replies {
        let request = bot
            .send_message(msg.chat.id, reply.text)
            .parse_mode(ParseMode::Html);
        match reply.keyboard.markup() {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
    }

    Ok(())
}

/// Handle an incoming message, commands included.
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    bot_name: Arc<String>,
) -> ResponseResult<()> {
    let Some(user_id) = authorized_sender(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let outcome = match msg.text() {
        Some(text) => on_message(&state, user_id, text, &bot_name).await,
        None => {
            let language = state.language_of(user_id).await;
            Outcome::text(texts(language).empty_input)
        }
    };
    deliver(&bot, &msg, outcome).await
}
