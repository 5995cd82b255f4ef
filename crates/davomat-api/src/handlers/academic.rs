//! Profile, timetable and attendance handlers.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Local, NaiveDate};

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{
    AttendanceQuery, AttendanceResponse, MentorFields, ProfileResponse, TimetableQuery,
    TimetableResponse,
};

/// GET /profile - Profile of the session user.
pub async fn profile(State(state): State<AppState>, user: AuthUser) -> Result<Json<ProfileResponse>> {
    let report = state.service.profile(&user.external_id).await?;
    let mentor = state.service.mentor(&report.auid).await;

    Ok(Json(ProfileResponse {
        username: report.auid,
        user_id: report.upstream_user_id,
        profile: report.data,
        mentor: MentorFields::from(mentor),
    }))
}

/// GET /timetable?date=YYYY-MM-DD - Lessons on one day (default today).
pub async fn timetable(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TimetableQuery>,
) -> Result<Json<TimetableResponse>> {
    let date = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest(format!("invalid date '{}', expected YYYY-MM-DD", raw)))?,
        None => Local::now().date_naive(),
    };

    let report = state.service.timetable(&user.external_id, date).await?;
    let mentor = state.service.mentor(&report.auid).await;

    Ok(Json(TimetableResponse {
        date: date.format("%Y-%m-%d").to_string(),
        timetable: report.data,
        mentor: MentorFields::from(mentor),
    }))
}

/// GET /attendance?period=N - Per-course attendance.
pub async fn attendance(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<AttendanceResponse>> {
    let period = match query.period.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) if p.chars().all(|c| c.is_ascii_alphanumeric()) => p.to_string(),
        Some(p) => return Err(ApiError::BadRequest(format!("invalid period '{}'", p))),
        None => state.service.default_period().to_string(),
    };

    let report = state
        .service
        .attendance(&user.external_id, Some(&period))
        .await?;
    let mentor = state.service.mentor(&report.auid).await;

    Ok(Json(AttendanceResponse {
        period,
        attendance: report.data,
        mentor: MentorFields::from(mentor),
    }))
}
