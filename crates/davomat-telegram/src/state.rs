//! Shared state for the Telegram bot.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use davomat_core::AcademicService;
use davomat_models::{ExternalId, Language};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Environment variable listing the Telegram user ids allowed to use the bot.
pub const ALLOWED_USERS_ENV: &str = "TELEGRAM_ALLOWED_USERS";

/// Where a user is in a multi-step exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversation {
    /// `/start` sent, waiting for a language choice.
    ChooseLanguage,
    /// Waiting for the ERP username.
    Username { language: Language },
    /// Waiting for the ERP password.
    Password { language: Language, username: String },
    /// `/lang` sent by a logged-in user.
    ChangeLanguage,
}

impl Conversation {
    /// Language fixed earlier in the login dialogue, if any.
    pub fn language(&self) -> Option<Language> {
        match self {
            Conversation::Username { language } | Conversation::Password { language, .. } => {
                Some(*language)
            }
            Conversation::ChooseLanguage | Conversation::ChangeLanguage => None,
        }
    }
}

/// Parses a comma-separated list of Telegram user ids.
///
/// Blank entries are skipped; unparsable ones are logged and skipped.
pub fn parse_allowed_users(raw: &str) -> HashSet<u64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(entry = %s, "Ignoring invalid entry in {}", ALLOWED_USERS_ENV);
                None
            }
        })
        .collect()
}

/// Shared state for the Telegram bot, accessible across all handlers.
pub struct BotState {
    service: Arc<AcademicService>,
    /// Telegram user ids allowed to talk to the bot. Empty means nobody.
    allowed: HashSet<u64>,
    /// Open dialogues (telegram user id -> step).
    conversations: RwLock<HashMap<u64, Conversation>>,
}

impl BotState {
    pub fn new(service: Arc<AcademicService>, allowed: HashSet<u64>) -> Self {
        Self {
            service,
            allowed,
            conversations: RwLock::new(HashMap::new()),
        }
    }

    pub fn service(&self) -> &AcademicService {
        &self.service
    }

    pub fn is_allowed(&self, user_id: u64) -> bool {
        self.allowed.contains(&user_id)
    }

    pub fn allowed_count(&self) -> usize {
        self.allowed.len()
    }

    pub async fn conversation(&self, user_id: u64) -> Option<Conversation> {
        self.conversations.read().await.get(&user_id).cloned()
    }

    pub async fn set_conversation(&self, user_id: u64, conversation: Conversation) {
        debug!(user_id, ?conversation, "Conversation step");
        self.conversations.write().await.insert(user_id, conversation);
    }

    pub async fn clear_conversation(&self, user_id: u64) {
        self.conversations.write().await.remove(&user_id);
    }

    /// Language to answer `user_id` in.
    ///
    /// A language picked in an unfinished login dialogue wins over the
    /// stored preference. Store failures fall back to the default.
    pub async fn language_of(&self, user_id: u64) -> Language {
        if let Some(language) = self.conversation(user_id).await.and_then(|c| c.language()) {
            return language;
        }

        match self.service.tokens().record(&ExternalId::telegram(user_id)).await {
            Ok(Some(record)) => record.preferred_language,
            Ok(None) => Language::default(),
            Err(e) => {
                warn!(user_id, error = %e, "Could not read stored language");
                Language::default()
            }
        }
    }
}
