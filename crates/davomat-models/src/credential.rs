//! Stored credential records.
//!
//! A [`UserCredential`] is the single persisted record per external identity.
//! It carries the upstream username, the encrypted password and the cached
//! bearer token together with the data needed to decide whether that token is
//! still usable.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ExternalId;

/// Token lifetime assumed when upstream does not report `expiresIn` (24h).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 3600;

/// Longest token lifetime honoured from upstream (30 days).
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;

fn default_ttl() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

/// Preferred language of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Uzbek.
    #[default]
    Uz,
    /// English.
    En,
}

impl Language {
    /// Short language code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Uz => "uz",
            Language::En => "en",
        }
    }

    /// Parses a language choice from free text (button label or code).
    ///
    /// Anything mentioning Uzbek maps to [`Language::Uz`]; everything else
    /// is English.
    pub fn from_choice(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("uz") || lower.contains("o'zbek") || lower.contains("ўзбек") {
            Language::Uz
        } else {
            Language::En
        }
    }
}

/// One persisted record per external identity.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCredential {
    /// Identity this record belongs to.
    pub external_id: ExternalId,

    /// Upstream ERP username.
    #[serde(default)]
    pub api_username: Option<String>,

    /// Password ciphertext. Never plaintext.
    #[serde(default)]
    pub password_encrypted: Option<String>,

    /// Cached upstream bearer token.
    #[serde(default)]
    pub cached_token: Option<String>,

    /// When `cached_token` was obtained.
    #[serde(default)]
    pub token_acquired_at: Option<DateTime<Utc>>,

    /// Token lifetime in seconds.
    #[serde(default = "default_ttl")]
    pub token_ttl_seconds: i64,

    /// User id assigned by the upstream system.
    #[serde(default)]
    pub upstream_user_id: Option<i64>,

    /// Display name reported by upstream at login.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Language used for chat replies.
    #[serde(default)]
    pub preferred_language: Language,
}

impl UserCredential {
    /// Creates an empty record for an identity.
    pub fn new(external_id: ExternalId) -> Self {
        Self {
            external_id,
            api_username: None,
            password_encrypted: None,
            cached_token: None,
            token_acquired_at: None,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECS,
            upstream_user_id: None,
            display_name: None,
            preferred_language: Language::default(),
        }
    }

    /// Instant the cached token stops being valid, if there is one.
    ///
    /// A lifetime that cannot be represented counts as already expired.
    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.cached_token.as_ref()?;
        let acquired = self.token_acquired_at?;
        Duration::try_seconds(self.token_ttl_seconds)
            .and_then(|ttl| acquired.checked_add_signed(ttl))
            .or(Some(acquired))
    }

    /// Whether the cached token is still valid at `now`.
    pub fn is_token_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.token_expires_at()
            .map(|expires| expires > now)
            .unwrap_or(false)
    }

    /// Whether the cached token is valid right now.
    pub fn is_token_valid(&self) -> bool {
        self.is_token_valid_at(Utc::now())
    }

    /// Applies a partial update, leaving unspecified fields untouched.
    pub fn apply(&mut self, update: CredentialUpdate) {
        if let Some(v) = update.api_username {
            self.api_username = Some(v);
        }
        if let Some(v) = update.password_encrypted {
            self.password_encrypted = Some(v);
        }
        if let Some(v) = update.cached_token {
            self.cached_token = Some(v);
        }
        if let Some(v) = update.token_acquired_at {
            self.token_acquired_at = Some(v);
        }
        if let Some(v) = update.token_ttl_seconds {
            self.token_ttl_seconds = v;
        }
        if let Some(v) = update.upstream_user_id {
            self.upstream_user_id = Some(v);
        }
        if let Some(v) = update.display_name {
            self.display_name = Some(v);
        }
        if let Some(v) = update.preferred_language {
            self.preferred_language = v;
        }
    }
}

impl fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredential")
            .field("external_id", &self.external_id)
            .field("api_username", &self.api_username)
            .field(
                "password_encrypted",
                &self.password_encrypted.as_ref().map(|_| "<redacted>"),
            )
            .field("cached_token", &self.cached_token.as_ref().map(|_| "<redacted>"))
            .field("token_acquired_at", &self.token_acquired_at)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("upstream_user_id", &self.upstream_user_id)
            .field("display_name", &self.display_name)
            .field("preferred_language", &self.preferred_language)
            .finish()
    }
}

/// Partial set of fields for an upsert. `None` means "leave as is".
#[derive(Debug, Clone, Default)]
pub struct CredentialUpdate {
    pub api_username: Option<String>,
    pub password_encrypted: Option<String>,
    pub cached_token: Option<String>,
    pub token_acquired_at: Option<DateTime<Utc>>,
    pub token_ttl_seconds: Option<i64>,
    pub upstream_user_id: Option<i64>,
    pub display_name: Option<String>,
    pub preferred_language: Option<Language>,
}

impl CredentialUpdate {
    /// Update carrying only fresh token fields.
    pub fn token(token: impl Into<String>, acquired_at: DateTime<Utc>, ttl_seconds: i64) -> Self {
        Self {
            cached_token: Some(token.into()),
            token_acquired_at: Some(acquired_at),
            token_ttl_seconds: Some(ttl_seconds),
            ..Default::default()
        }
    }

    /// Update carrying only a language change.
    pub fn language(language: Language) -> Self {
        Self {
            preferred_language: Some(language),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_token(acquired_at: DateTime<Utc>, ttl: i64) -> UserCredential {
        let mut record = UserCredential::new(ExternalId::telegram(1));
        record.apply(CredentialUpdate::token("tok", acquired_at, ttl));
        record
    }

    #[test]
    fn test_new_record_has_no_valid_token() {
        let record = UserCredential::new(ExternalId::telegram(1));
        assert!(!record.is_token_valid());
        assert_eq!(record.token_ttl_seconds, DEFAULT_TOKEN_TTL_SECS);
        assert_eq!(record.preferred_language, Language::Uz);
    }

    #[test]
    fn test_token_validity_window() {
        let now = Utc::now();
        let record = record_with_token(now - Duration::seconds(100), 3600);
        assert!(record.is_token_valid_at(now));
        assert!(!record.is_token_valid_at(now + Duration::seconds(3500)));
    }

    #[test]
    fn test_unrepresentable_ttl_counts_as_expired() {
        let now = Utc::now();
        for ttl in [9_000_000_000_000_000, i64::MAX, i64::MIN] {
            let record = record_with_token(now - Duration::seconds(1), ttl);
            assert!(!record.is_token_valid_at(now), "ttl {ttl}");
        }
    }

    #[test]
    fn test_token_without_timestamp_is_invalid() {
        let mut record = UserCredential::new(ExternalId::telegram(1));
        record.cached_token = Some("tok".to_string());
        assert!(!record.is_token_valid());
    }

    #[test]
    fn test_timestamp_without_token_is_invalid() {
        let mut record = record_with_token(Utc::now(), 3600);
        record.cached_token = None;
        assert!(!record.is_token_valid());
    }

    #[test]
    fn test_apply_leaves_unspecified_fields() {
        let mut record = UserCredential::new(ExternalId::telegram(1));
        record.api_username = Some("user".to_string());
        record.display_name = Some("Name".to_string());

        record.apply(CredentialUpdate::language(Language::En));

        assert_eq!(record.api_username.as_deref(), Some("user"));
        assert_eq!(record.display_name.as_deref(), Some("Name"));
        assert_eq!(record.preferred_language, Language::En);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut record = record_with_token(Utc::now(), 60);
        record.password_encrypted = Some("ciphertext".to_string());
        let debug = format!("{:?}", record);
        assert!(!debug.contains("ciphertext"));
        assert!(!debug.contains("\"tok\""));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_language_from_choice() {
        assert_eq!(Language::from_choice("🇺🇿 O'zbek"), Language::Uz);
        assert_eq!(Language::from_choice("uz"), Language::Uz);
        assert_eq!(Language::from_choice("🇬🇧 English"), Language::En);
    }

    #[test]
    fn test_missing_ttl_deserializes_to_default() {
        let json = r#"{"external_id":"tg:1"}"#;
        let record: UserCredential = serde_json::from_str(json).unwrap();
        assert_eq!(record.token_ttl_seconds, DEFAULT_TOKEN_TTL_SECS);
        assert_eq!(record.preferred_language, Language::Uz);
    }
}
