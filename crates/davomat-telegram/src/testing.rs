//! Shared fixtures for bot tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use davomat_core::{AcademicService, ErpApi, ErpError, MentorDirectory, Result, TokenManager};
use davomat_models::{AttendanceRecord, LoginGrant, Mentor, Profile, TimetableEntry, UNKNOWN};
use davomat_persistence::{JsonCredentialStore, PasswordCipher};

use crate::state::BotState;

pub const PASSWORD: &str = "pw";

/// In-process ERP double.
#[derive(Default)]
pub struct FakeErp {
    pub logins: AtomicUsize,
    pub down: bool,
}

#[async_trait]
impl ErpApi for FakeErp {
    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant> {
        let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        if self.down {
            return Err(ErpError::UpstreamUnavailable("connection refused".into()));
        }
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
        Ok(vec![TimetableEntry {
            date: date.format("%Y-%m-%d").to_string(),
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
        if self.down {
            return Err(ErpError::UpstreamUnavailable("HTTP 500".into()));
        }
        Ok(vec![AttendanceRecord {
            course: "Physics".into(),
            course_code: "PH1".into(),
            present_count: 12,
            total_count: 20,
            percentage: 60.0,
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

    async fn fetch_mentor(&self, _: &str, _: &str) -> Result<Option<Mentor>> {
        Ok(None)
    }
}

/// Bot state over an in-memory store, allowing `allowed` users.
pub fn bot_state(erp: FakeErp, allowed: &[u64]) -> Arc<BotState> {
    bot_state_with(Arc::new(erp), allowed)
}

pub fn bot_state_with(erp: Arc<FakeErp>, allowed: &[u64]) -> Arc<BotState> {
    let store = Arc::new(JsonCredentialStore::in_memory());
    let tokens = Arc::new(TokenManager::new(store, erp.clone(), PasswordCipher::new([9; 32])));
    let mentors = Arc::new(MentorDirectory::new(erp, None));
    let service = Arc::new(AcademicService::new(tokens, mentors, "3"));

    Arc::new(BotState::new(service, allowed.iter().copied().collect()))
}
