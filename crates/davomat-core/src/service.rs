//! Front-end facing operations.
//!
//! Each operation obtains a valid token through the [`TokenManager`] and
//! then runs one upstream fetch. Both the chat bot and the REST server go
//! through this type, so token handling lives in exactly one place.

use std::sync::Arc;

use chrono::NaiveDate;
use davomat_models::{AttendanceRecord, ExternalId, Mentor, Profile, TimetableEntry};

use crate::error::Result;
use crate::lifecycle::{TokenManager, ValidToken};
use crate::mentor::MentorDirectory;

/// Upstream data together with who it belongs to.
#[derive(Debug, Clone)]
pub struct Report<T> {
    pub data: T,
    /// Upstream username (AUID) of the student.
    pub auid: String,
    pub upstream_user_id: i64,
    /// Whether a silent re-login happened to serve this report.
    pub refreshed: bool,
}

impl<T> Report<T> {
    fn new(data: T, token: ValidToken) -> Self {
        Self {
            data,
            auid: token.api_username,
            upstream_user_id: token.upstream_user_id,
            refreshed: token.refreshed,
        }
    }
}

/// Timetable, attendance, profile and mentor lookups for stored identities.
pub struct AcademicService {
    tokens: Arc<TokenManager>,
    mentors: Arc<MentorDirectory>,
    default_period: String,
}

impl AcademicService {
    pub fn new(
        tokens: Arc<TokenManager>,
        mentors: Arc<MentorDirectory>,
        default_period: impl Into<String>,
    ) -> Self {
        Self {
            tokens,
            mentors,
            default_period: default_period.into(),
        }
    }

    /// Token lifecycle manager used by this service.
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Attendance period used when the caller gives none.
    pub fn default_period(&self) -> &str {
        &self.default_period
    }

    pub async fn timetable(&self, id: &ExternalId, date: NaiveDate) -> Result<Report<Vec<TimetableEntry>>> {
        let token = self.tokens.ensure_valid_token(id).await?;
        let entries = self
            .tokens
            .api()
            .fetch_timetable(&token.token, token.upstream_user_id, date)
            .await?;
        Ok(Report::new(entries, token))
    }

    pub async fn attendance(
        &self,
        id: &ExternalId,
        period: Option<&str>,
    ) -> Result<Report<Vec<AttendanceRecord>>> {
        let period = period.unwrap_or(&self.default_period);
        let token = self.tokens.ensure_valid_token(id).await?;
        let records = self
            .tokens
            .api()
            .fetch_attendance(&token.token, token.upstream_user_id, period)
            .await?;
        Ok(Report::new(records, token))
    }

    pub async fn profile(&self, id: &ExternalId) -> Result<Report<Profile>> {
        let token = self.tokens.ensure_valid_token(id).await?;
        let profile = self
            .tokens
            .api()
            .fetch_profile(&token.token, token.upstream_user_id)
            .await?;
        Ok(Report::new(profile, token))
    }

    /// Best-effort mentor of the student `auid`.
    pub async fn mentor(&self, auid: &str) -> Option<Mentor> {
        self.mentors.lookup(auid).await
    }
}
