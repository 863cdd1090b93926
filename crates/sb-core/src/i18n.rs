//! Text lookup for user-facing strings.

/// Localization boundary: `text(key, locale)`.
pub trait Localizer: Send + Sync {
    fn text(&self, key: &str, locale: &str) -> String;

    fn supports(&self, locale: &str) -> bool;
}

const FALLBACK_LOCALE: &str = "en";

/// (key, en, ru)
const ENTRIES: &[(&str, &str, &str)] = &[
    (
        "scrn_main",
        "<b>Splitty</b>\n\nSplit shared expenses with friends. Create a room to start.",
        "<b>Splitty</b>\n\nДелите общие расходы с друзьями. Создайте комнату, чтобы начать.",
    ),
    ("btn_create_room", "Create room", "Создать комнату"),
    (
        "enter_room_name",
        "Send the name of the new room.",
        "Отправьте название новой комнаты.",
    ),
    (
        "room_created",
        "Room <b>{name}</b> created.",
        "Комната <b>{name}</b> создана.",
    ),
    (
        "room_name_invalid",
        "Room name must be 1 to 64 characters. Try again.",
        "Название комнаты должно быть от 1 до 64 символов. Попробуйте ещё раз.",
    ),
    ("lang_set", "Language set to English.", "Язык изменён на русский."),
    (
        "lang_usage",
        "Usage: /lang en | ru",
        "Использование: /lang en | ru",
    ),
    (
        "error_generic",
        "Something went wrong. Please try again.",
        "Что-то пошло не так. Попробуйте ещё раз.",
    ),
    (
        "button_expired",
        "This button is no longer valid.",
        "Эта кнопка больше не действует.",
    ),
];

/// Built-in English/Russian catalog.
#[derive(Clone, Copy, Debug, Default)]
pub struct Catalog;

impl Localizer for Catalog {
    fn text(&self, key: &str, locale: &str) -> String {
        let Some((_, en, ru)) = ENTRIES.iter().find(|(k, _, _)| *k == key) else {
            return key.to_string();
        };
        match normalize(locale) {
            "ru" => ru.to_string(),
            _ => en.to_string(),
        }
    }

    fn supports(&self, locale: &str) -> bool {
        matches!(normalize(locale), "en" | "ru")
    }
}

/// `ru-RU` / `RU` -> `ru`.
fn normalize(locale: &str) -> &str {
    let base = locale.split(['-', '_']).next().unwrap_or(FALLBACK_LOCALE);
    if base.eq_ignore_ascii_case("ru") {
        "ru"
    } else if base.eq_ignore_ascii_case("en") {
        "en"
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_english_then_key() {
        let c = Catalog;
        assert_eq!(c.text("btn_create_room", "ru-RU"), "Создать комнату");
        assert_eq!(c.text("btn_create_room", "de"), "Create room");
        assert_eq!(c.text("no_such_key", "en"), "no_such_key");
    }

    #[test]
    fn supported_locales() {
        assert!(Catalog.supports("EN"));
        assert!(Catalog.supports("ru_RU"));
        assert!(!Catalog.supports("fr"));
    }
}
