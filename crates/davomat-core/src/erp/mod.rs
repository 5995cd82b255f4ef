//! Upstream ERP adapter.
//!
//! [`ErpApi`] is the seam between the token lifecycle and the network:
//! [`ErpClient`] talks to the real ERP over HTTP, tests substitute fakes.

mod client;
pub mod remap;

pub use client::ErpClient;

use async_trait::async_trait;
use chrono::NaiveDate;
use davomat_models::{AttendanceRecord, LoginGrant, Mentor, Profile, TimetableEntry};

use crate::error::Result;

/// Authenticated operations against the upstream ERP.
#[async_trait]
pub trait ErpApi: Send + Sync {
    /// Exchanges a username and password for a bearer token.
    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant>;

    /// Lessons and holidays on `date`, sorted by time slot.
    async fn fetch_timetable(
        &self,
        token: &str,
        upstream_user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<TimetableEntry>>;

    /// Per-course attendance for an academic period.
    async fn fetch_attendance(
        &self,
        token: &str,
        upstream_user_id: i64,
        period: &str,
    ) -> Result<Vec<AttendanceRecord>>;

    /// User details joined with the first role.
    async fn fetch_profile(&self, token: &str, upstream_user_id: i64) -> Result<Profile>;

    /// Looks up the mentor of the student `auid` with a service-account token.
    async fn fetch_mentor(&self, service_token: &str, auid: &str) -> Result<Option<Mentor>>;
}
