//! Localized chat texts.
//!
//! Every user-facing string lives in a [`Texts`] table, one per
//! [`Language`]. Handlers look the table up once and never branch on the
//! language themselves.

use davomat_models::Language;

/// Action behind a reply-keyboard button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Today,
    Attendance,
    Profile,
    Language,
    Logout,
}

impl Action {
    const ALL: [Action; 5] = [
        Action::Today,
        Action::Attendance,
        Action::Profile,
        Action::Language,
        Action::Logout,
    ];

    /// Maps a button label in any language to its action.
    pub fn from_button(text: &str) -> Option<Self> {
        let text = text.trim();
        [Language::Uz, Language::En].iter().find_map(|&lang| {
            let t = texts(lang);
            Self::ALL.iter().copied().find(|&a| t.button(a) == text)
        })
    }
}

/// Label of the Uzbek choice on the language picker.
pub const LANGUAGE_UZ_BUTTON: &str = "🇺🇿 O'zbek";

/// Label of the English choice on the language picker.
pub const LANGUAGE_EN_BUTTON: &str = "🇬🇧 English";

/// All strings shown to chat users in one language.
#[derive(Debug)]
pub struct Texts {
    pub choose_lang: &'static str,
    pub ask_username: &'static str,
    pub ask_password: &'static str,
    pub checking_login: &'static str,
    pub login_success: &'static str,
    pub login_fail: &'static str,
    pub already_logged: &'static str,
    pub token_refreshed: &'static str,
    pub help: &'static str,
    pub language_set: &'static str,
    pub logged_out: &'static str,
    pub nothing_to_logout: &'static str,
    pub access_denied: &'static str,
    pub unknown_input: &'static str,
    pub empty_input: &'static str,

    // Errors
    pub not_logged_in: &'static str,
    pub credentials_unavailable: &'static str,
    pub relogin_failed: &'static str,
    pub upstream_unavailable: &'static str,
    pub internal_error: &'static str,

    // Timetable and attendance
    pub today_title: &'static str,
    pub no_classes: &'static str,
    pub attendance_title: &'static str,
    pub attendance_empty: &'static str,
    pub short_code: &'static str,
    pub course_code: &'static str,

    // Profile labels
    pub profile_title: &'static str,
    pub label_id: &'static str,
    pub label_name: &'static str,
    pub label_username: &'static str,
    pub label_student_id: &'static str,
    pub label_year: &'static str,
    pub label_email: &'static str,
    pub label_mobile: &'static str,
    pub label_role: &'static str,
    pub label_role_id: &'static str,
    pub label_user_type: &'static str,
    pub label_mentor: &'static str,
    pub mentor_not_found: &'static str,

    // Buttons
    pub btn_today: &'static str,
    pub btn_attendance: &'static str,
    pub btn_profile: &'static str,
    pub btn_language: &'static str,
    pub btn_logout: &'static str,
}

impl Texts {
    /// Label of the button for `action`.
    pub fn button(&self, action: Action) -> &'static str {
        match action {
            Action::Today => self.btn_today,
            Action::Attendance => self.btn_attendance,
            Action::Profile => self.btn_profile,
            Action::Language => self.btn_language,
            Action::Logout => self.btn_logout,
        }
    }
}

static UZ: Texts = Texts {
    choose_lang: "Tilni tanlang / Select language:",
    ask_username: "👋 Salom! Iltimos username kiriting:",
    ask_password: "🔒 Endi password yuboring:",
    checking_login: "⏳ Tekshirilmoqda...",
    login_success: "✅ Login muvaffaqiyatli! Tugmalardan foydalaning:",
    login_fail: "❌ Login ishlamadi: username yoki password xato. Username'ni qaytadan kiriting:",
    already_logged: "✅ Siz allaqachon tizimga kirgansiz.",
    token_refreshed: "🔄 Token muddati tugagan edi, avtomatik qayta kirildi.",
    help: "📖 Buyruqlar:\n\
        /start - tizimga kirish\n\
        /today - bugungi darslar\n\
        /attendance - davomat\n\
        /me - profil\n\
        /lang - tilni o'zgartirish\n\
        /logout - chiqish",
    language_set: "✅ Til o'zgartirildi.",
    logged_out: "👋 Siz tizimdan chiqdingiz. Ma'lumotlaringiz o'chirildi.",
    nothing_to_logout: "ℹ️ Saqlangan ma'lumot yo'q.",
    access_denied: "⛔ Sizga ruxsat berilmagan.",
    unknown_input: "🤔 Tushunmadim. /help ni ko'ring.",
    empty_input: "✏️ Iltimos matn yuboring.",

    not_logged_in: "❌ Avval login qiling (/start).",
    credentials_unavailable: "❗ Parol bazada mavjud emas. /start bilan qayta login qiling.",
    relogin_failed: "❌ Avtomatik login amalga oshmadi. /start bilan qayta login qiling.",
    upstream_unavailable: "❌ Server bilan bog'lanishda xatolik. Keyinroq urinib ko'ring.",
    internal_error: "⚠️ Ichki xatolik yuz berdi.",

    today_title: "📅 Bugungi darslar",
    no_classes: "📭 Bugun darslar topilmadi.",
    attendance_title: "✅ Davomat",
    attendance_empty: "📭 Davomat ma'lumotlari topilmadi.",
    short_code: "Short",
    course_code: "Kod",

    profile_title: "👤 Profil ma'lumotlari",
    label_id: "🆔 ID",
    label_name: "👤 Ism",
    label_username: "💻 API username",
    label_student_id: "🔢 Emp/Std ID",
    label_year: "🎓 Kurs/semestr",
    label_email: "📧 Email",
    label_mobile: "📱 Telefon",
    label_role: "🎭 Rol",
    label_role_id: "🔖 Role ID",
    label_user_type: "🔰 User type",
    label_mentor: "🧑‍🏫 Mentor",
    mentor_not_found: "Mentor topilmadi",

    btn_today: "📅 Bugungi darslar",
    btn_attendance: "✅ Davomat",
    btn_profile: "👤 Profil",
    btn_language: "🌐 Til",
    btn_logout: "🚪 Chiqish",
};

static EN: Texts = Texts {
    choose_lang: "Select language / Tilni tanlang:",
    ask_username: "👋 Hello! Please enter your username:",
    ask_password: "🔒 Now send your password:",
    checking_login: "⏳ Checking...",
    login_success: "✅ Login successful! Use the buttons below:",
    login_fail: "❌ Login failed: wrong username or password. Enter your username again:",
    already_logged: "✅ You are already logged in.",
    token_refreshed: "🔄 Your session had expired and was renewed automatically.",
    help: "📖 Commands:\n\
        /start - log in\n\
        /today - today's classes\n\
        /attendance - attendance\n\
        /me - profile\n\
        /lang - change language\n\
        /logout - log out",
    language_set: "✅ Language changed.",
    logged_out: "👋 You are logged out. Your stored data was deleted.",
    nothing_to_logout: "ℹ️ Nothing is stored for you.",
    access_denied: "⛔ You are not allowed to use this bot.",
    unknown_input: "🤔 I didn't get that. See /help.",
    empty_input: "✏️ Please send text.",

    not_logged_in: "❌ Please log in first (/start).",
    credentials_unavailable: "❗ No usable password on file. Log in again with /start.",
    relogin_failed: "❌ Automatic re-login failed. Log in again with /start.",
    upstream_unavailable: "❌ Could not reach the university server. Try again later.",
    internal_error: "⚠️ Internal error.",

    today_title: "📅 Today's classes",
    no_classes: "📭 No classes today.",
    attendance_title: "✅ Attendance",
    attendance_empty: "📭 No attendance data.",
    short_code: "Short",
    course_code: "Code",

    profile_title: "👤 Profile info",
    label_id: "🆔 ID",
    label_name: "👤 Name",
    label_username: "💻 API username",
    label_student_id: "🔢 Emp/Std ID",
    label_year: "🎓 Year/semester",
    label_email: "📧 Email",
    label_mobile: "📱 Mobile",
    label_role: "🎭 Role",
    label_role_id: "🔖 Role ID",
    label_user_type: "🔰 User type",
    label_mentor: "🧑‍🏫 Mentor",
    mentor_not_found: "Mentor not found",

    btn_today: "📅 Today's Classes",
    btn_attendance: "✅ Attendance",
    btn_profile: "👤 Profile",
    btn_language: "🌐 Language",
    btn_logout: "🚪 Log out",
};

/// Text table for `language`.
pub fn texts(language: Language) -> &'static Texts {
    match language {
        Language::Uz => &UZ,
        Language::En => &EN,
    }
}

/// Parses a language-picker answer. Accepts the button labels and codes.
pub fn parse_language(text: &str) -> Option<Language> {
    let lower = text.trim().to_lowercase();
    let known = text.trim() == LANGUAGE_UZ_BUTTON
        || text.trim() == LANGUAGE_EN_BUTTON
        || ["uz", "en", "o'zbek", "english"].contains(&lower.as_str());
    known.then(|| Language::from_choice(&lower))
}
