//! Field remapping from upstream JSON to normalized records.
//!
//! The upstream ERP names the same field differently depending on the
//! endpoint and record kind (a lesson and a holiday share the timetable
//! list). Each output field therefore has a fixed preference order of
//! upstream keys; the first present, non-empty value wins and [`UNKNOWN`]
//! fills in when none is. Missing keys never produce errors.

use chrono::{NaiveDate, NaiveTime};
use davomat_models::{AttendanceRecord, LoginGrant, Mentor, Profile, TimetableEntry, UNKNOWN};
use serde_json::Value;

use davomat_models::{DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};

/// Renders a scalar as text. Objects, arrays, nulls and empty strings count
/// as absent.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First present value among `keys`.
fn first(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| item.get(key).and_then(scalar))
}

/// First present value among `keys`, or `fallback`.
fn text_or(item: &Value, keys: &[&str], fallback: &str) -> String {
    first(item, keys).unwrap_or_else(|| fallback.to_string())
}

fn text(item: &Value, keys: &[&str]) -> String {
    text_or(item, keys, UNKNOWN)
}

/// Numbers or numeric strings; anything else is `None`.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn count(item: &Value, key: &str) -> u32 {
    item.get(key)
        .and_then(number)
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n.round().min(u32::MAX as f64) as u32)
        .unwrap_or(0)
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Whether the body carries `success: true`.
pub(crate) fn is_success(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool).unwrap_or(false)
}

/// Parses the `authenticate` response.
///
/// Returns the reason as `Err` when upstream reported failure or the body
/// lacks a token or user id.
pub fn login_grant(body: &Value) -> Result<LoginGrant, String> {
    if !is_success(body) {
        return Err("upstream reported success=false".to_string());
    }
    let data = body.get("data").ok_or("response has no data")?;

    let token = data
        .get("token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or("response has no token")?;
    let upstream_user_id = data
        .get("userId")
        .and_then(integer)
        .ok_or("response has no userId")?;
    let ttl_seconds = data
        .get("expiresIn")
        .and_then(integer)
        .filter(|ttl| *ttl > 0)
        .map(|ttl| ttl.min(MAX_TOKEN_TTL_SECS))
        .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

    Ok(LoginGrant {
        token: token.to_string(),
        upstream_user_id,
        full_name: text_or(data, &["name", "fullName"], ""),
        ttl_seconds,
    })
}

/// Date the timetable item applies to, as its first ten characters.
fn entry_date(item: &Value) -> Option<String> {
    let raw = first(item, &["selected_date", "date_of_class", "from_date"])?;
    Some(raw.chars().take(10).collect())
}

fn entry_time(item: &Value) -> String {
    if let Some(slot) = first(item, &["timeSlots"]) {
        return slot;
    }
    match (first(item, &["start_time"]), first(item, &["end_time"])) {
        (Some(start), Some(end)) => format!("{} - {}", start, end),
        (Some(start), None) => start,
        (None, Some(end)) => end,
        (None, None) => UNKNOWN.to_string(),
    }
}

/// Start of a slot such as `9:00 - 10:20` or `01:00 PM - 02:20 PM`.
fn slot_start(slot: &str) -> Option<NaiveTime> {
    let start = slot.split_once('-').map_or(slot, |(start, _)| start).trim();
    ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(start, fmt).ok())
}

fn timetable_entry(item: &Value, date: String) -> TimetableEntry {
    TimetableEntry {
        date,
        time: entry_time(item),
        subject: text(item, &["course_name", "holiday_name"]),
        short_code: text(item, &["course_short_name", "leave_type_short"]),
        course_code: text(item, &["course_assignment_coursecode", "course_code"]),
        teacher: text(item, &["employee_name"]),
        room: text(item, &["roomcode"]),
        status: text(item, &["present_status", "attendance_status"]),
    }
}

/// Extracts the entries for `target` from a month timetable response.
///
/// `data` is a list of day blocks, each a list of lessons or holidays. A
/// bare object in place of a block is treated as a one-item block. Entries
/// are sorted by time, keeping upstream order for equal slots.
pub fn timetable_entries(body: &Value, target: NaiveDate) -> Vec<TimetableEntry> {
    let wanted = target.format("%Y-%m-%d").to_string();
    let Some(blocks) = body.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut entries: Vec<TimetableEntry> = blocks
        .iter()
        .flat_map(|block| match block {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            Value::Object(_) => vec![block],
            _ => Vec::new(),
        })
        .filter_map(|item| {
            let date = entry_date(item)?;
            (date == wanted).then(|| timetable_entry(item, date))
        })
        .collect();

    // Chronological; slots without a readable start keep upstream order, last.
    entries.sort_by_key(|e| {
        let start = slot_start(&e.time);
        (start.is_none(), start)
    });
    entries
}

/// Maps the attendance report list.
pub fn attendance_records(body: &Value) -> Vec<AttendanceRecord> {
    let Some(items) = body.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| AttendanceRecord {
            course: text(item, &["course_name"]),
            course_code: text(item, &["course_assignment_coursecode"]),
            present_count: count(item, "present"),
            total_count: count(item, "total"),
            percentage: item
                .get("percentage")
                .and_then(number)
                .filter(|p| p.is_finite())
                .unwrap_or(0.0),
        })
        .collect()
}

/// Joins user details with the first role, if any.
///
/// `details` is the `data` object of `getUserDetailsById`; `roles` is the
/// whole `findRoles` body when that call succeeded.
pub fn profile(details: &Value, roles: Option<&Value>) -> Profile {
    let role = roles
        .and_then(|body| body.get("data"))
        .and_then(|data| match data {
            Value::Array(items) => items.first(),
            Value::Object(_) => Some(data),
            _ => None,
        })
        .unwrap_or(&Value::Null);

    Profile {
        full_name: text(details, &["name", "preferredName", "userName"]),
        email: text(details, &["email", "emailId"]),
        mobile: text(details, &["mobileNumber", "mobile"]),
        student_id: text(details, &["empOrStdId"]),
        year_or_sem: text(details, &["year_or_sem", "yearOrSem"]),
        user_type: text(details, &["usertype"]),
        role_name: text_or(role, &["role_name", "role", "name"], "Unknown"),
        role_short_name: text_or(role, &["role_short_name", "roleShort"], "N/A"),
        role_id: text(role, &["role_id", "id"]),
    }
}

/// Finds the mentor of the student whose AUID is `auid`.
pub fn find_mentor(body: &Value, auid: &str) -> Option<Mentor> {
    let content = body
        .pointer("/data/Paginated_data/content")
        .and_then(Value::as_array)?;

    content
        .iter()
        .find(|item| {
            item.get("auid")
                .and_then(Value::as_str)
                .is_some_and(|a| a.trim().eq_ignore_ascii_case(auid.trim()))
        })
        .map(|item| Mentor {
            name: text(item, &["employee_name"]),
            code: text(item, &["empcode"]),
        })
}
