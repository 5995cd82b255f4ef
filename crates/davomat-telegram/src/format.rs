//! HTML rendering of upstream data for chat replies.

use davomat_core::ErpError;
use davomat_models::{AttendanceRecord, Mentor, Profile, TimetableEntry, UNKNOWN};
use teloxide::utils::html::escape;

use crate::i18n::Texts;

/// Traffic-light badge for an attendance percentage.
pub fn attendance_badge(percentage: f64) -> &'static str {
    if percentage >= 75.0 {
        "🟢"
    } else if percentage >= 50.0 {
        "🟡"
    } else {
        "🔴"
    }
}

/// Formats a percentage without a trailing `.0`.
fn percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Today's lessons, one block per entry.
pub fn timetable(t: &Texts, entries: &[TimetableEntry]) -> String {
    if entries.is_empty() {
        return t.no_classes.to_string();
    }

    let blocks: Vec<String> = entries
        .iter()
        .map(|e| {
            let mut block = format!(
                "📚 <b>{}</b>\n🔖 {}: {} | {}: {}\n⏰ {}",
                escape(&e.subject),
                t.short_code,
                escape(&e.short_code),
                t.course_code,
                escape(&e.course_code),
                escape(&e.time),
            );
            if e.teacher != UNKNOWN {
                block.push_str(&format!("\n👨‍🏫 {}", escape(&e.teacher)));
            }
            if e.room != UNKNOWN {
                block.push_str(&format!("\n🏫 {}", escape(&e.room)));
            }
            if e.status != UNKNOWN {
                block.push_str(&format!("\n📌 {}", escape(&e.status)));
            }
            block
        })
        .collect();

    format!("<b>{}</b>\n\n{}", t.today_title, blocks.join("\n\n"))
}

/// Per-course attendance with badges.
pub fn attendance(t: &Texts, records: &[AttendanceRecord]) -> String {
    if records.is_empty() {
        return t.attendance_empty.to_string();
    }

    let lines: Vec<String> = records
        .iter()
        .map(|r| {
            format!(
                "📚 {} | {}\n{} {}/{} | {}%",
                escape(&r.course),
                escape(&r.course_code),
                attendance_badge(r.percentage),
                r.present_count,
                r.total_count,
                percent(r.percentage),
            )
        })
        .collect();

    format!("<b>{}</b>\n\n{}", t.attendance_title, lines.join("\n\n"))
}

/// Profile card.
pub fn profile(
    t: &Texts,
    profile: &Profile,
    upstream_user_id: i64,
    auid: &str,
    mentor: Option<&Mentor>,
) -> String {
    let mentor = match mentor {
        Some(m) => format!("{} ({})", escape(&m.name), escape(&m.code)),
        None => t.mentor_not_found.to_string(),
    };

    format!(
        "<b>{}</b>\n\n\
        {}: <code>{}</code>\n\
        {}: {}\n\
        {}: <code>{}</code>\n\
        {}: {}\n\
        {}: {}\n\
        {}: {}\n\
        {}: {}\n\
        {}: {} ({})\n\
        {}: {}\n\
        {}: {}\n\
        {}: {}",
        t.profile_title,
        t.label_id,
        upstream_user_id,
        t.label_name,
        escape(&profile.full_name),
        t.label_username,
        escape(auid),
        t.label_student_id,
        escape(&profile.student_id),
        t.label_year,
        escape(&profile.year_or_sem),
        t.label_email,
        escape(&profile.email),
        t.label_mobile,
        escape(&profile.mobile),
        t.label_role,
        escape(&profile.role_name),
        escape(&profile.role_short_name),
        t.label_role_id,
        escape(&profile.role_id),
        t.label_user_type,
        escape(&profile.user_type),
        t.label_mentor,
        mentor,
    )
}

/// Localized message for a failed operation.
pub fn error(t: &Texts, err: &ErpError) -> &'static str {
    match err {
        ErpError::NotAuthenticated => t.not_logged_in,
        ErpError::CredentialsUnavailable => t.credentials_unavailable,
        ErpError::ReauthenticationFailed(_) => t.relogin_failed,
        ErpError::UpstreamAuthFailed(_) => t.login_fail,
        ErpError::UpstreamUnavailable(_) => t.upstream_unavailable,
        ErpError::Config(_) | ErpError::Cipher(_) | ErpError::Store(_) => t.internal_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::texts;
    use davomat_models::Language;

    fn entry(subject: &str, teacher: &str) -> TimetableEntry {
        TimetableEntry {
            date: "2025-03-10".into(),
            time: "09:00 - 10:20".into(),
            subject: subject.into(),
            short_code: "MA".into(),
            course_code: "MA101".into(),
            teacher: teacher.into(),
            room: UNKNOWN.into(),
            status: UNKNOWN.into(),
        }
    }

    #[test]
    fn test_badge_thresholds() {
        assert_eq!(attendance_badge(100.0), "🟢");
        assert_eq!(attendance_badge(75.0), "🟢");
        assert_eq!(attendance_badge(74.9), "🟡");
        assert_eq!(attendance_badge(50.0), "🟡");
        assert_eq!(attendance_badge(49.9), "🔴");
        assert_eq!(attendance_badge(0.0), "🔴");
    }

    #[test]
    fn test_timetable_rendering() {
        let t = texts(Language::En);
        let text = timetable(t, &[entry("Maths <1>", "Dr. A")]);
        assert!(text.contains("Maths &lt;1&gt;"));
        assert!(text.contains("Dr. A"));
        assert!(text.contains("09:00 - 10:20"));
        assert!(!text.contains("🏫"), "unknown room is omitted");

        assert_eq!(timetable(t, &[]), t.no_classes);
    }

    #[test]
    fn test_attendance_rendering() {
        let t = texts(Language::Uz);
        let text = attendance(
            t,
            &[AttendanceRecord {
                course: "Physics".into(),
                course_code: "PH1".into(),
                present_count: 9,
                total_count: 20,
                percentage: 45.0,
            }],
        );
        assert!(text.contains("🔴 9/20 | 45%"));
        assert!(text.starts_with("<b>✅ Davomat</b>"));
        assert_eq!(attendance(t, &[]), t.attendance_empty);
    }

    #[test]
    fn test_profile_mentor_placeholder() {
        let t = texts(Language::En);
        let p = Profile {
            full_name: "Axror".into(),
            email: UNKNOWN.into(),
            mobile: UNKNOWN.into(),
            student_id: "ABT24CCS008".into(),
            year_or_sem: UNKNOWN.into(),
            user_type: "student".into(),
            role_name: "Unknown".into(),
            role_short_name: "N/A".into(),
            role_id: UNKNOWN.into(),
        };

        let text = profile(t, &p, 689, "ABT24CCS008", None);
        assert!(text.contains("<code>689</code>"));
        assert!(text.contains("Mentor not found"));
        assert!(text.contains("🎓 Year/semester: -\n📧 Email: -"));

        let mentor = Mentor {
            name: "Dr. M".into(),
            code: "E2".into(),
        };
        assert!(profile(t, &p, 689, "ABT24CCS008", Some(&mentor)).contains("Dr. M (E2)"));
    }

    #[test]
    fn test_error_messages() {
        let t = texts(Language::En);
        assert_eq!(error(t, &ErpError::NotAuthenticated), t.not_logged_in);
        assert_eq!(
            error(t, &ErpError::UpstreamUnavailable("x".into())),
            t.upstream_unavailable
        );
        assert_eq!(
            error(t, &ErpError::ReauthenticationFailed("x".into())),
            t.relogin_failed
        );
        assert_eq!(
            error(t, &ErpError::Cipher(davomat_persistence::CipherError::Encryption)),
            t.internal_error
        );
    }

    #[test]
    fn test_percent_format() {
        assert_eq!(percent(90.0), "90");
        assert_eq!(percent(66.666), "66.7");
    }
}
