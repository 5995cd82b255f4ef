//! Response DTOs for the API.

use davomat_models::{AttendanceRecord, Mentor, Profile, TimetableEntry, UNKNOWN};
use serde::Serialize;

/// Shown when the mentor lookup found nobody or is unavailable.
pub const MENTOR_NOT_FOUND: &str = "Mentor not found";

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Successful login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: String,
}

/// Generic success message.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Mentor fields appended to academic responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentorFields {
    pub mentor: String,
    pub mentor_code: String,
}

impl From<Option<Mentor>> for MentorFields {
    fn from(mentor: Option<Mentor>) -> Self {
        match mentor {
            Some(m) => Self {
                mentor: m.name,
                mentor_code: m.code,
            },
            None => Self {
                mentor: MENTOR_NOT_FOUND.to_string(),
                mentor_code: UNKNOWN.to_string(),
            },
        }
    }
}

/// `GET /profile`.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub user_id: i64,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(flatten)]
    pub mentor: MentorFields,
}

/// `GET /timetable`.
#[derive(Debug, Clone, Serialize)]
pub struct TimetableResponse {
    pub date: String,
    pub timetable: Vec<TimetableEntry>,
    #[serde(flatten)]
    pub mentor: MentorFields,
}

/// `GET /attendance`.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceResponse {
    pub period: String,
    pub attendance: Vec<AttendanceRecord>,
    #[serde(flatten)]
    pub mentor: MentorFields,
}
