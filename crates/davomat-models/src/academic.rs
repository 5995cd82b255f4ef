//! Normalized academic records.
//!
//! These are the stable output shapes produced from the upstream ERP's
//! inconsistent JSON. Every string field is always populated; absent
//! upstream values become [`UNKNOWN`].

use serde::{Deserialize, Serialize};

/// Sentinel used when no upstream key supplied a value.
pub const UNKNOWN: &str = "-";

/// Result of a successful upstream login.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginGrant {
    /// Upstream bearer token.
    pub token: String,
    /// User id assigned by upstream.
    pub upstream_user_id: i64,
    /// Display name, empty if upstream did not report one.
    pub full_name: String,
    /// Token lifetime in seconds.
    pub ttl_seconds: i64,
}

impl std::fmt::Debug for LoginGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginGrant")
            .field("token", &"<redacted>")
            .field("upstream_user_id", &self.upstream_user_id)
            .field("full_name", &self.full_name)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

/// A single lesson or holiday on the timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    /// Date in `YYYY-MM-DD`.
    pub date: String,
    /// Time slot, e.g. `09:00 - 10:30`.
    pub time: String,
    /// Course name, or holiday name for holiday entries.
    pub subject: String,
    /// Short course name, or leave type for holiday entries.
    pub short_code: String,
    /// Course code.
    pub course_code: String,
    /// Teacher name.
    pub teacher: String,
    /// Room code.
    pub room: String,
    /// Attendance status for this lesson.
    pub status: String,
}

/// Attendance summary for one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Course name.
    pub course: String,
    /// Course code.
    pub course_code: String,
    /// Classes attended.
    pub present_count: u32,
    /// Classes held.
    pub total_count: u32,
    /// Attendance percentage as reported upstream.
    pub percentage: f64,
}

/// Mentor (proctor) assigned to a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mentor {
    /// Mentor's name.
    pub name: String,
    /// Mentor's employee code.
    pub code: String,
}

/// User profile joined with the first upstream role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    /// Employee or student id (AUID).
    pub student_id: String,
    /// Current year or semester of study.
    pub year_or_sem: String,
    pub user_type: String,
    pub role_name: String,
    pub role_short_name: String,
    pub role_id: String,
}
