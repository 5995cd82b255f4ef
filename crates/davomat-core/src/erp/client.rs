//! HTTP client for the upstream ERP.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use davomat_models::{AttendanceRecord, LoginGrant, Mentor, Profile, TimetableEntry};
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::remap;
use super::ErpApi;
use crate::config::ErpConfig;
use crate::error::{ErpError, Result};

const PROCTOR_PAGE_SIZE: &str = "10000";

/// `reqwest`-backed [`ErpApi`] implementation.
#[derive(Clone)]
pub struct ErpClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ErpClient {
    /// Builds a client with the configured timeout and TLS policy.
    pub fn new(config: &ErpConfig) -> Result<Self> {
        // A trailing slash keeps the last base segment when joining.
        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))
            .map_err(|e| ErpError::Config(format!("invalid ERP base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ErpError::Config(format!(
                "ERP base URL cannot have paths: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ErpError::Config(format!("failed to build HTTP client: {}", e)))?;

        if config.accept_invalid_certs {
            warn!("TLS certificate validation is disabled for the ERP host");
        }

        Ok(Self { client, base_url })
    }

    /// Resolves an endpoint from path segments, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ErpError::Config("ERP base URL cannot have paths".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Authenticated GET that fails on non-2xx and returns the JSON body.
    async fn get_json(&self, url: Url, token: &str, query: &[(&str, String)]) -> Result<Value> {
        debug!(path = url.path(), "ERP request");

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(path = url.path(), status = %status, "ERP request failed");
            return Err(ErpError::UpstreamUnavailable(format!(
                "{} returned HTTP {}",
                url.path(),
                status
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ErpApi for ErpClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant> {
        let url = self.endpoint(&["authenticate"])?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ErpError::UpstreamAuthFailed(format!("HTTP {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ErpError::UpstreamAuthFailed(format!("malformed response: {}", e)))?;
        let grant = remap::login_grant(&body).map_err(ErpError::UpstreamAuthFailed)?;

        debug!(upstream_user_id = grant.upstream_user_id, "ERP login succeeded");
        Ok(grant)
    }

    async fn fetch_timetable(
        &self,
        token: &str,
        upstream_user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<TimetableEntry>> {
        let url = self.endpoint(&["academic", "timeTableDetailsOfStudentOrEmployeeForMobile"])?;
        let query = [
            ("student_id", upstream_user_id.to_string()),
            ("year", date.year().to_string()),
            ("month", date.month().to_string()),
        ];

        let body = self.get_json(url, token, &query).await?;
        Ok(remap::timetable_entries(&body, date))
    }

    async fn fetch_attendance(
        &self,
        token: &str,
        upstream_user_id: i64,
        period: &str,
    ) -> Result<Vec<AttendanceRecord>> {
        let id = upstream_user_id.to_string();
        let url = self.endpoint(&[
            "student",
            "attendanceReportForStudentProfileByStudentId",
            &id,
            period,
        ])?;

        let body = self.get_json(url, token, &[]).await?;
        if !remap::is_success(&body) {
            return Err(ErpError::UpstreamUnavailable(
                "attendance report returned success=false".to_string(),
            ));
        }
        Ok(remap::attendance_records(&body))
    }

    async fn fetch_profile(&self, token: &str, upstream_user_id: i64) -> Result<Profile> {
        let id = upstream_user_id.to_string();

        let body = self
            .get_json(self.endpoint(&["getUserDetailsById", &id])?, token, &[])
            .await?;
        if !remap::is_success(&body) {
            return Err(ErpError::UpstreamUnavailable(
                "user details returned success=false".to_string(),
            ));
        }
        let details = body.get("data").cloned().unwrap_or(Value::Null);

        let roles = match self
            .get_json(self.endpoint(&["findRoles", &id])?, token, &[])
            .await
        {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(error = %e, "Role lookup failed; using placeholders");
                None
            }
        };

        Ok(remap::profile(&details, roles.as_ref()))
    }

    async fn fetch_mentor(&self, service_token: &str, auid: &str) -> Result<Option<Mentor>> {
        let url = self.endpoint(&["proctor", "fetchAllProctorStudentAssignmentDetail"])?;
        let query = [
            ("page", "0".to_string()),
            ("page_size", PROCTOR_PAGE_SIZE.to_string()),
            ("sort", "created_date".to_string()),
        ];

        let body = self.get_json(url, service_token, &query).await?;
        Ok(remap::find_mentor(&body, auid))
    }
}
