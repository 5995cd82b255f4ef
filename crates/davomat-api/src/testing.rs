//! Shared fixtures for handler and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use davomat_core::{
    AcademicService, ErpApi, ErpError, MentorDirectory, Result, ServiceAccount, TokenManager,
};
use davomat_models::{AttendanceRecord, LoginGrant, Mentor, Profile, TimetableEntry, UNKNOWN};
use davomat_persistence::{JsonCredentialStore, PasswordCipher};

use crate::auth::JwtConfig;
use crate::config::ApiConfig;
use crate::state::AppState;

pub const PASSWORD: &str = "pw";
pub const JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// In-process ERP double.
#[derive(Default)]
pub struct FakeErp {
    pub logins: AtomicUsize,
    pub attendance_down: bool,
}

#[async_trait]
impl ErpApi for FakeErp {
    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant> {
        let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        if password != PASSWORD {
            return Err(ErpError::UpstreamAuthFailed("success=false".into()));
        }
        Ok(LoginGrant {
            token: format!("{}-{}", username, n),
            upstream_user_id: 689,
            full_name: "Axror".into(),
            ttl_seconds: 3600,
        })
    }

    async fn fetch_timetable(&self, _: &str, _: i64, date: NaiveDate) -> Result<Vec<TimetableEntry>> {
        if date != NaiveDate::from_ymd_opt(2025, 3, 10).unwrap() {
            return Ok(Vec::new());
        }
        Ok(vec![TimetableEntry {
            date: "2025-03-10".into(),
            time: "09:00 - 10:20".into(),
            subject: "Maths".into(),
            short_code: "MA".into(),
            course_code: "MA101".into(),
            teacher: "Dr. A".into(),
            room: "A-1".into(),
            status: UNKNOWN.into(),
        }])
    }

    async fn fetch_attendance(&self, _: &str, _: i64, _: &str) -> Result<Vec<AttendanceRecord>> {
        if self.attendance_down {
            return Err(ErpError::UpstreamUnavailable("HTTP 500".into()));
        }
        Ok(vec![AttendanceRecord {
            course: "Maths".into(),
            course_code: "MA101".into(),
            present_count: 18,
            total_count: 20,
            percentage: 90.0,
        }])
    }

    async fn fetch_profile(&self, _: &str, _: i64) -> Result<Profile> {
        Ok(Profile {
            full_name: "Axror".into(),
            email: "a@uni.uz".into(),
            mobile: UNKNOWN.into(),
            student_id: "ABT24CCS008".into(),
            year_or_sem: "3".into(),
            user_type: "student".into(),
            role_name: "Student".into(),
            role_short_name: "STD".into(),
            role_id: "4".into(),
        })
    }

    async fn fetch_mentor(&self, _: &str, auid: &str) -> Result<Option<Mentor>> {
        Ok((auid == "ABT24CCS008").then(|| Mentor {
            name: "Dr. Mentor".into(),
            code: "E2".into(),
        }))
    }
}

/// State over an in-memory store and `erp`.
pub fn test_state(erp: FakeErp) -> (AppState, Arc<FakeErp>) {
    let erp = Arc::new(erp);
    let store = Arc::new(JsonCredentialStore::in_memory());
    let tokens = Arc::new(TokenManager::new(
        store,
        erp.clone(),
        PasswordCipher::new([5; 32]),
    ));
    let mentors = Arc::new(MentorDirectory::new(
        erp.clone(),
        Some(ServiceAccount {
            username: "svc".into(),
            password: PASSWORD.into(),
        }),
    ));
    let service = Arc::new(AcademicService::new(tokens, mentors, "3"));

    let state = AppState::new(ApiConfig::default(), JwtConfig::new(JWT_SECRET, 60), service);
    (state, erp)
}
