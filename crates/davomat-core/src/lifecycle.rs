//! Token lifecycle.
//!
//! [`TokenManager`] hands out a usable upstream bearer token for an
//! identity. A cached token inside its TTL is returned without any network
//! traffic; otherwise the stored password is decrypted in memory and
//! replayed against the upstream login, and the fresh token is written back.
//!
//! Refreshes for one identity are serialized through a per-identity mutex,
//! and the record is re-read after the mutex is acquired so a refresh that
//! finished meanwhile is reused instead of repeated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use davomat_models::{CredentialUpdate, ExternalId, Language, UserCredential};
use davomat_persistence::{CredentialStore, PasswordCipher};
use tracing::{debug, info, warn};

use crate::erp::ErpApi;
use crate::error::{ErpError, Result};

/// A token that was valid when it was handed out.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidToken {
    /// Upstream bearer token.
    pub token: String,
    /// Upstream user id the token belongs to.
    pub upstream_user_id: i64,
    /// Upstream username (the student's AUID).
    pub api_username: String,
    /// Whether a re-login was needed to obtain it.
    pub refreshed: bool,
}

impl std::fmt::Debug for ValidToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidToken")
            .field("token", &"<redacted>")
            .field("upstream_user_id", &self.upstream_user_id)
            .field("api_username", &self.api_username)
            .field("refreshed", &self.refreshed)
            .finish()
    }
}

impl ValidToken {
    fn cached(record: &UserCredential) -> Option<Self> {
        if !record.is_token_valid() {
            return None;
        }
        Some(Self {
            token: record.cached_token.clone()?,
            upstream_user_id: record.upstream_user_id?,
            api_username: record.api_username.clone()?,
            refreshed: false,
        })
    }
}

/// Issues valid upstream tokens for stored identities.
pub struct TokenManager {
    store: Arc<dyn CredentialStore>,
    api: Arc<dyn ErpApi>,
    cipher: PasswordCipher,
    refresh_locks: Mutex<HashMap<ExternalId, Arc<tokio::sync::Mutex<()>>>>,
}

impl TokenManager {
    pub fn new(store: Arc<dyn CredentialStore>, api: Arc<dyn ErpApi>, cipher: PasswordCipher) -> Self {
        Self {
            store,
            api,
            cipher,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying upstream API.
    pub fn api(&self) -> &Arc<dyn ErpApi> {
        &self.api
    }

    /// Stored record for `id`, if any.
    pub async fn record(&self, id: &ExternalId) -> Result<Option<UserCredential>> {
        Ok(self.store.get(id).await?)
    }

    /// Returns a valid token for `id`, re-authenticating if needed.
    ///
    /// # Errors
    ///
    /// - [`ErpError::NotAuthenticated`] when no record exists
    /// - [`ErpError::CredentialsUnavailable`] when the stored password is
    ///   missing or cannot be decrypted
    /// - [`ErpError::ReauthenticationFailed`] when upstream rejects the
    ///   replayed login; the stored record is left as it was
    pub async fn ensure_valid_token(&self, id: &ExternalId) -> Result<ValidToken> {
        let record = self.store.get(id).await?.ok_or(ErpError::NotAuthenticated)?;
        if let Some(valid) = ValidToken::cached(&record) {
            debug!(external_id = %id, "Using cached token");
            return Ok(valid);
        }

        let lock = self.refresh_lock(id);
        let result = {
            let _guard = lock.lock().await;
            match self.store.get(id).await {
                Ok(Some(record)) => match ValidToken::cached(&record) {
                    Some(valid) => Ok(valid),
                    None => self.refresh(id, &record).await,
                },
                Ok(None) => Err(ErpError::NotAuthenticated),
                Err(e) => Err(e.into()),
            }
        };
        drop(lock);
        self.prune_locks();
        result
    }

    async fn refresh(&self, id: &ExternalId, record: &UserCredential) -> Result<ValidToken> {
        let (Some(username), Some(envelope)) = (&record.api_username, &record.password_encrypted)
        else {
            warn!(external_id = %id, "No stored password; interactive login required");
            return Err(ErpError::CredentialsUnavailable);
        };

        let password = self.cipher.decrypt(envelope).map_err(|e| {
            warn!(external_id = %id, error = %e, "Stored password cannot be decrypted");
            ErpError::from(e)
        })?;

        let acquired_at = Utc::now();
        let grant = self.api.login(username, &password).await.map_err(|e| {
            warn!(external_id = %id, error = %e, "Silent re-login failed");
            ErpError::ReauthenticationFailed(e.to_string())
        })?;

        let mut update = CredentialUpdate::token(grant.token.clone(), acquired_at, grant.ttl_seconds);
        if record.upstream_user_id.is_none() {
            update.upstream_user_id = Some(grant.upstream_user_id);
        }
        let stored = self.store.upsert(id, update).await?;

        info!(external_id = %id, ttl = grant.ttl_seconds, "Token refreshed");
        Ok(ValidToken {
            token: grant.token,
            upstream_user_id: stored.upstream_user_id.unwrap_or(grant.upstream_user_id),
            api_username: username.clone(),
            refreshed: true,
        })
    }

    /// Logs in with caller-supplied credentials and stores the result.
    ///
    /// Nothing is persisted when upstream rejects the login.
    pub async fn login_and_store(
        &self,
        id: &ExternalId,
        username: &str,
        password: &str,
        language: Option<Language>,
    ) -> Result<UserCredential> {
        let username = username.trim();
        let acquired_at = Utc::now();
        let grant = self.api.login(username, password).await?;
        let password_encrypted = self.cipher.encrypt(password)?;

        let record = self
            .store
            .upsert(
                id,
                CredentialUpdate {
                    api_username: Some(username.to_string()),
                    password_encrypted: Some(password_encrypted),
                    cached_token: Some(grant.token),
                    token_acquired_at: Some(acquired_at),
                    token_ttl_seconds: Some(grant.ttl_seconds),
                    upstream_user_id: Some(grant.upstream_user_id),
                    display_name: Some(grant.full_name),
                    preferred_language: language,
                },
            )
            .await?;

        info!(external_id = %id, upstream_user_id = grant.upstream_user_id, "Logged in");
        Ok(record)
    }

    /// Changes the chat language of an existing record.
    pub async fn set_language(&self, id: &ExternalId, language: Language) -> Result<UserCredential> {
        if self.store.get(id).await?.is_none() {
            return Err(ErpError::NotAuthenticated);
        }
        Ok(self.store.upsert(id, CredentialUpdate::language(language)).await?)
    }

    /// Forgets the identity. Returns whether a record existed.
    pub async fn logout(&self, id: &ExternalId) -> Result<bool> {
        let removed = self.store.remove(id).await?;
        if removed {
            info!(external_id = %id, "Logged out");
        }
        Ok(removed)
    }

    fn refresh_lock(&self, id: &ExternalId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .refresh_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(id.clone()).or_default())
    }

    fn prune_locks(&self) {
        let mut locks = self
            .refresh_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
