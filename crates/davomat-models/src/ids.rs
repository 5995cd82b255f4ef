//! Identity types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a calling identity.
///
/// Chat users and REST sessions live in separate namespaces so the same
/// store can serve both front-ends: `tg:<user id>` and `api:<username>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    /// Identity of a Telegram user.
    pub fn telegram(user_id: u64) -> Self {
        Self(format!("tg:{}", user_id))
    }

    /// Identity of a REST session, keyed by the upstream API username.
    ///
    /// Usernames are case-insensitive upstream, so they are normalized.
    pub fn api(username: &str) -> Self {
        Self(format!("api:{}", username.trim().to_uppercase()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_do_not_collide() {
        let tg = ExternalId::telegram(42);
        let api = ExternalId::api("42");
        assert_eq!(tg.as_str(), "tg:42");
        assert_eq!(api.as_str(), "api:42");
        assert_ne!(tg, api);
    }

    #[test]
    fn test_api_username_normalized() {
        assert_eq!(ExternalId::api(" abt24ccs008 "), ExternalId::api("ABT24CCS008"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ExternalId::telegram(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"tg:7\"");
    }
}
