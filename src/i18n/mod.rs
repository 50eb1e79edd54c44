//! Internationalization module
//!
//! Provides translations for French (fr) and English (en) languages.
//! Supports automatic language detection based on system locale.

mod en;
mod fr;

use crate::core::{Category, Error, TouPeriod};
use std::collections::HashMap;

/// Internationalization manager
pub struct I18n {
    current_lang: String,
    translations: HashMap<String, String>,
}

impl I18n {
    /// Create a new I18n instance with the specified language
    pub fn new(lang: &str) -> Self {
        let mut i18n = Self {
            current_lang: String::new(),
            translations: HashMap::new(),
        };
        i18n.set_language(lang);
        i18n
    }

    /// Set the current language
    pub fn set_language(&mut self, lang: &str) {
        let lang = if lang == "auto" {
            detect_system_language()
        } else {
            lang.to_string()
        };

        self.translations = match lang.as_str() {
            "fr" => fr::get_translations(),
            _ => en::get_translations(),
        };
        self.current_lang = if lang == "fr" { lang } else { "en".to_string() };

        log::debug!("Language set to: {}", self.current_lang);
    }

    /// Get a translated string by key
    pub fn get(&self, key: &str) -> String {
        self.translations
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Get the current language code
    pub fn current_language(&self) -> &str {
        &self.current_lang
    }

    pub fn category(&self, category: Category) -> String {
        self.get(&format!("category.{}", category.as_str()))
    }

    pub fn period(&self, period: TouPeriod) -> String {
        self.get(&format!("tou.{}", period.as_str()))
    }

    /// Operator-facing message for an error.
    ///
    /// Domain errors keep their detail so the operator sees what to fix;
    /// infrastructure errors only get the generic sentence.
    pub fn describe_error(&self, error: &Error) -> String {
        let summary = self.get(error.message_key());
        if error.is_client_error() {
            format!("{}: {}", summary, error.detail())
        } else {
            summary
        }
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("auto")
    }
}

/// Detect system language
fn detect_system_language() -> String {
    // Try to detect from environment variables
    let lang_env = std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LC_MESSAGES"))
        .or_else(|_| std::env::var("LANG"))
        .unwrap_or_else(|_| "en".to_string());

    // Extract language code (e.g., "fr_FR.UTF-8" -> "fr")
    let lang_code = lang_env
        .split(['_', '.'])
        .next()
        .unwrap_or("en");

    // Only return supported languages
    match lang_code {
        "fr" => "fr".to_string(),
        _ => "en".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translations_have_the_same_keys() {
        let en = en::get_translations();
        let fr = fr::get_translations();

        let mut missing: Vec<_> = en.keys().filter(|k| !fr.contains_key(*k)).collect();
        missing.sort();
        assert!(missing.is_empty(), "missing French keys: {:?}", missing);
        assert_eq!(en.len(), fr.len());
    }

    #[test]
    fn test_unknown_key_falls_back_to_key() {
        let i18n = I18n::new("en");
        assert_eq!(i18n.get("no.such.key"), "no.such.key");
    }

    #[test]
    fn test_unsupported_language_uses_english() {
        let i18n = I18n::new("de");
        assert_eq!(i18n.current_language(), "en");
        assert_eq!(i18n.category(Category::Agricultural), "Agricultural");
    }

    #[test]
    fn test_labels() {
        let i18n = I18n::new("fr");
        assert_eq!(i18n.period(TouPeriod::OffPeak), "Heures creuses");
        assert_eq!(i18n.category(Category::Industrial), "Industriel");
    }

    #[test]
    fn test_describe_domain_error_keeps_detail() {
        let i18n = I18n::new("en");
        let err = Error::NotFound("no tariff data available for the selected category".to_string());

        assert_eq!(
            i18n.describe_error(&err),
            "No data found: no tariff data available for the selected category"
        );
    }

    #[test]
    fn test_describe_internal_error_hides_detail() {
        let i18n = I18n::new("fr");
        let err = Error::Serialization("unexpected token at line 3".to_string());

        assert_eq!(i18n.describe_error(&err), "Une erreur est survenue");
    }
}
