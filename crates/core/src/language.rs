//! Reply languages
//!
//! The assistant answers in one of a closed set of languages. Moroccan Darija,
//! whether typed in Arabic script or Latin transliteration, is answered in Arabic.

use serde::{Deserialize, Serialize};

/// Supported reply languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Arabic => "ar",
            Self::French => "fr",
            Self::English => "en",
        }
    }

    /// Human-readable name, used in prompt language overrides
    pub fn name(&self) -> &'static str {
        match self {
            Self::Arabic => "Modern Standard Arabic",
            Self::French => "French",
            Self::English => "English",
        }
    }

    pub fn script(&self) -> Script {
        match self {
            Self::Arabic => Script::Arabic,
            Self::French | Self::English => Script::Latin,
        }
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self.script(), Script::Arabic)
    }

    /// Parse from a code, a name, or a BCP-47 locale such as `ar-MA` or `fr-FR`
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        let primary = s.split(['-', '_']).next().unwrap_or("");
        match primary {
            "ar" | "ara" | "arabic" | "darija" => Some(Self::Arabic),
            "fr" | "fra" | "fre" | "french" | "francais" | "français" => Some(Self::French),
            "en" | "eng" | "english" => Some(Self::English),
            _ => None,
        }
    }

    pub fn all() -> &'static [Language] {
        &[Self::Arabic, Self::French, Self::English]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Writing systems seen in customer messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Script {
    Latin,
    Arabic,
}

impl Script {
    /// Unicode blocks covering the script (Arabic includes its supplement and
    /// presentation forms, which show up in pasted text)
    fn ranges(&self) -> &'static [(u32, u32)] {
        match self {
            Self::Latin => &[(0x0041, 0x005A), (0x0061, 0x007A), (0x00C0, 0x024F)],
            Self::Arabic => &[
                (0x0600, 0x06FF),
                (0x0750, 0x077F),
                (0x08A0, 0x08FF),
                (0xFB50, 0xFDFF),
                (0xFE70, 0xFEFF),
            ],
        }
    }

    pub fn contains_char(&self, c: char) -> bool {
        let code = c as u32;
        self.ranges()
            .iter()
            .any(|(start, end)| code >= *start && code <= *end)
    }

    /// True if any character of `text` belongs to this script
    pub fn appears_in(&self, text: &str) -> bool {
        text.chars().any(|c| self.contains_char(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_code() {
        assert_eq!(Language::Arabic.code(), "ar");
        assert_eq!(Language::French.code(), "fr");
        assert_eq!(Language::English.code(), "en");
    }

    #[test]
    fn test_language_from_locale() {
        assert_eq!(Language::from_str_loose("ar-MA"), Some(Language::Arabic));
        assert_eq!(Language::from_str_loose("fr-FR"), Some(Language::French));
        assert_eq!(Language::from_str_loose("EN"), Some(Language::English));
        assert_eq!(Language::from_str_loose("es-ES"), None);
    }

    #[test]
    fn test_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Language::French).unwrap(), "\"fr\"");
        let lang: Language = serde_json::from_str("\"ar\"").unwrap();
        assert_eq!(lang, Language::Arabic);
    }

    #[test]
    fn test_script_detection() {
        assert!(Script::Arabic.appears_in("مشكل الكهرباء"));
        assert!(!Script::Arabic.appears_in("salam, 3andi mochkil"));
        assert!(Language::Arabic.is_rtl());
    }
}
