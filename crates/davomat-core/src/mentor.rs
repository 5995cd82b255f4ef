//! Mentor directory backed by a service account.
//!
//! The proctor assignment list is only readable with a staff account, so
//! lookups log in once with the configured service account and cache that
//! token for the life of the process. A failed lookup drops the cached token
//! and retries once with a fresh login; anything beyond that degrades to
//! "no mentor".

use std::sync::Arc;

use davomat_models::Mentor;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::ServiceAccount;
use crate::erp::ErpApi;
use crate::error::Result;

/// Best-effort mentor lookup with a cached service-account token.
pub struct MentorDirectory {
    api: Arc<dyn ErpApi>,
    account: Option<ServiceAccount>,
    token: RwLock<Option<String>>,
}

impl MentorDirectory {
    /// Creates a directory. Without an account every lookup returns `None`.
    pub fn new(api: Arc<dyn ErpApi>, account: Option<ServiceAccount>) -> Self {
        Self {
            api,
            account,
            token: RwLock::new(None),
        }
    }

    /// Whether a service account is configured.
    pub fn is_enabled(&self) -> bool {
        self.account.is_some()
    }

    /// Mentor of the student with AUID `auid`, or `None` on any failure.
    pub async fn lookup(&self, auid: &str) -> Option<Mentor> {
        let account = self.account.as_ref()?;

        match self.try_lookup(account, auid).await {
            Ok(mentor) => mentor,
            Err(first) => {
                debug!(error = %first, "Mentor lookup failed; retrying with a fresh login");
                self.token.write().await.take();
                match self.try_lookup(account, auid).await {
                    Ok(mentor) => mentor,
                    Err(e) => {
                        warn!(error = %e, "Mentor lookup unavailable");
                        None
                    }
                }
            }
        }
    }

    async fn try_lookup(&self, account: &ServiceAccount, auid: &str) -> Result<Option<Mentor>> {
        let token = self.service_token(account).await?;
        self.api.fetch_mentor(&token, auid).await
    }

    async fn service_token(&self, account: &ServiceAccount) -> Result<String> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }

        let grant = self.api.login(&account.username, &account.password).await?;
        *self.token.write().await = Some(grant.token.clone());
        debug!("Service account logged in");
        Ok(grant.token)
    }
}
