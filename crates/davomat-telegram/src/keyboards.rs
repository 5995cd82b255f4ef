//! Reply keyboards.

use davomat_models::Language;
use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};

use crate::i18n::{texts, Action, LANGUAGE_EN_BUTTON, LANGUAGE_UZ_BUTTON};

/// Keyboard change attached to a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    /// Leave whatever the client shows.
    Keep,
    MainMenu(Language),
    LanguagePicker,
    Remove,
}

impl Keyboard {
    pub fn markup(self) -> Option<ReplyMarkup> {
        match self {
            Keyboard::Keep => None,
            Keyboard::MainMenu(language) => Some(main_menu(language).into()),
            Keyboard::LanguagePicker => Some(language_picker().into()),
            Keyboard::Remove => Some(KeyboardRemove::new().into()),
        }
    }
}

/// Main menu in `language`.
pub fn main_menu(language: Language) -> KeyboardMarkup {
    let t = texts(language);
    let button = |action| KeyboardButton::new(t.button(action));

    KeyboardMarkup::new(vec![
        vec![button(Action::Today), button(Action::Attendance)],
        vec![button(Action::Profile)],
        vec![button(Action::Language), button(Action::Logout)],
    ])
    .resize_keyboard()
}

pub fn language_picker() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(LANGUAGE_UZ_BUTTON),
        KeyboardButton::new(LANGUAGE_EN_BUTTON),
    ]])
    .resize_keyboard()
    .one_time_keyboard()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(markup: &KeyboardMarkup) -> Vec<String> {
        markup
            .keyboard
            .iter()
            .flatten()
            .map(|b| b.text.clone())
            .collect()
    }

    #[test]
    fn test_main_menu_buttons_round_trip() {
        for language in [Language::Uz, Language::En] {
            let labels = labels(&main_menu(language));
            assert_eq!(labels.len(), 5);
            for label in labels {
                assert!(Action::from_button(&label).is_some(), "{label}");
            }
        }
    }

    #[test]
    fn test_language_picker() {
        let labels = labels(&language_picker());
        assert_eq!(labels, vec![LANGUAGE_UZ_BUTTON, LANGUAGE_EN_BUTTON]);
    }

    #[test]
    fn test_keep_has_no_markup() {
        assert!(Keyboard::Keep.markup().is_none());
        assert!(Keyboard::Remove.markup().is_some());
    }
}
