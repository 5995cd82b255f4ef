//! Request DTOs for the API.

use serde::Deserialize;

/// OAuth2-style password form for `POST /login`.
#[derive(Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Query for `GET /timetable`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimetableQuery {
    /// Day to show, `YYYY-MM-DD`. Defaults to today.
    pub date: Option<String>,
}

/// Query for `GET /attendance`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceQuery {
    /// Academic period. Defaults to the configured period.
    pub period: Option<String>,
}
