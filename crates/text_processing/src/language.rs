//! Language Inferencer
//!
//! Deterministic reply-language choice. Priority order:
//! 1. the last assistant turn is in Arabic script (sticky session)
//! 2. the message contains Arabic script
//! 3. the message contains Latin-transliterated Darija
//! 4. the message contains French markers
//! 5. English

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;
use utility_agent_core::{last_assistant_turn, Language, Script, Turn};

/// Digits standing in for Arabic consonants (3 = ع, 7 = ح, 9 = ق), followed by
/// at least two letters so `mp3` or `win7` do not count
static DARIJA_DIGIT_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[a-z]*[379][a-z]{2,}[a-z0-9]*\b").unwrap());

/// Ordinals, times and units that look like digit-words (`3rd`, `9am`, `7kwh`)
static NUMERIC_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[0-9]+(?:st|nd|rd|th|am|pm|min|mn|kg|km|kw|kwh)$").unwrap());

static DARIJA_MARKERS: &[&str] = &[
    "salam", "slm", "wach", "wash", "wesh", "kayn", "kayna", "kaynach", "kaynch", "makaynch",
    "makaynach", "bghit", "bghina", "afak", "3afak", "chno", "chnou", "chnu", "daba", "dyal",
    "dial", "diali", "dyali", "mochkil", "mouchkil", "machi", "walo", "bzaf", "khoya", "khouya",
    "lbareh", "lyoum", "safi", "wakha", "hadchi", "hadi", "rah", "nta", "nti", "kifach",
    "3lach", "3lash", "mzyan", "lma", "ddaw", "lkahraba", "tqta3", "m9tou3", "m9toua", "nkhles",
    "nkhless", "khlest", "khallast",
];

static FRENCH_MARKERS: &[&str] = &[
    "bonjour", "bonsoir", "salut", "merci", "je", "j'ai", "j'aimerais", "vous", "votre", "mon",
    "mes", "est", "sont", "pas", "une", "les", "des", "du", "avec", "pour", "depuis", "chez",
    "pourquoi", "comment", "quand", "facture", "coupure", "courant", "eau", "électricité",
    "electricite", "contrat", "numéro", "payer", "paiement", "svp", "s'il", "plaît", "aujourd'hui",
    "n'ai", "n'est", "d'eau", "l'eau", "il", "elle", "nous",
];

fn words_lower(text: &str) -> Vec<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

/// Latin-transliterated Darija (digit-consonants or colloquial markers)
pub fn has_darija_markers(text: &str) -> bool {
    if DARIJA_DIGIT_WORD
        .find_iter(text)
        .any(|m| !NUMERIC_SUFFIX.is_match(m.as_str()))
    {
        return true;
    }
    words_lower(text)
        .iter()
        .any(|w| DARIJA_MARKERS.contains(&w.as_str()))
}

pub fn has_french_markers(text: &str) -> bool {
    words_lower(text)
        .iter()
        .any(|w| FRENCH_MARKERS.contains(&w.as_str()))
}

/// Infer the reply language for `text` given the conversation so far.
/// Total: every input maps to exactly one language.
pub fn infer_language(text: &str, history: &[Turn]) -> Language {
    if last_assistant_turn(history)
        .map(|t| Script::Arabic.appears_in(&t.content))
        .unwrap_or(false)
    {
        return Language::Arabic;
    }
    if Script::Arabic.appears_in(text) {
        return Language::Arabic;
    }
    if has_darija_markers(text) {
        return Language::Arabic;
    }
    if has_french_markers(text) {
        return Language::French;
    }
    Language::English
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arabic_script() {
        assert_eq!(infer_language("مشكل الكهرباء", &[]), Language::Arabic);
    }

    #[test]
    fn test_darija_latin() {
        assert_eq!(infer_language("3andi mochkil f lma", &[]), Language::Arabic);
        assert_eq!(infer_language("salam, ma kaynach daw", &[]), Language::Arabic);
        assert!(has_darija_markers("l7ouma kamla"));
        assert!(!has_darija_markers("3701455886 / 1014871"));
    }

    #[test]
    fn test_alphanumeric_tokens_are_not_darija() {
        for text in ["send the mp3 file", "win7 laptop", "the 3rd floor", "at 9am", "model x7"] {
            assert!(!has_darija_markers(text), "{}", text);
            assert_eq!(infer_language(text, &[]), Language::English, "{}", text);
        }
        assert!(has_darija_markers("wa7ed l'mochkil"));
        assert!(has_darija_markers("3afak"));
    }

    #[test]
    fn test_french() {
        assert_eq!(
            infer_language("Bonjour, je n'ai pas d'électricité", &[]),
            Language::French
        );
    }

    #[test]
    fn test_english_default() {
        assert_eq!(infer_language("My power is out", &[]), Language::English);
        assert_eq!(infer_language("3701455886 / 1014871", &[]), Language::English);
        assert_eq!(infer_language("", &[]), Language::English);
    }

    #[test]
    fn test_sticky_arabic_session() {
        let history = vec![
            Turn::user("مشكل الماء"),
            Turn::assistant("المرجو إرسال رقم عقد الماء"),
        ];
        assert_eq!(infer_language("ok thanks", &history), Language::Arabic);
    }

    #[test]
    fn test_non_arabic_assistant_turn_not_sticky() {
        let history = vec![Turn::user("hi"), Turn::assistant("Hello, how can I help?")];
        assert_eq!(infer_language("merci", &history), Language::French);
    }
}
