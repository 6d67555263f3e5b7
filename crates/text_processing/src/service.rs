//! Service Classifier
//!
//! Keyword and script heuristics deciding whether a message is about water,
//! electricity, both, or neither. Covers Modern Standard Arabic, Darija in
//! Arabic script and Latin transliteration, French and English.

use once_cell::sync::Lazy;
use regex::Regex;
use utility_agent_core::{user_turns_newest_first, ServiceScope, Turn};

// Arabic forms accept the attached conjunction/preposition and article
static WATER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \b[وفبل]?(?:ال)?(?:ماء|مياه)\b
        | \b[وفب]?الما\b
        | \b[وفب]?(?:ال)?روبيني\b
        | \b(?:water|tap|taps|eau|l'eau|d'eau|robinet|lma|l'ma|lmaa|elma)\b
        ",
    )
    .unwrap()
});

static ELECTRICITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \b[وفبل]?(?:ال)?(?:كهرباء|كهربا|ضو|ضوء|تريسيتي)\b
        | \b[وفب]?التيار\b
        | \b(?:electricity|electric|electrical|power|lights?
            |électricité|electricite|électrique|electrique|courant|lumière|lumiere
            |kahraba|lkahraba|trisinti|trisiti|ddaw|daw|dou|ddou)\b
        ",
    )
    .unwrap()
});

/// Classify a single message
pub fn classify(text: &str) -> ServiceScope {
    ServiceScope::from_matches(
        WATER_PATTERN.is_match(text),
        ELECTRICITY_PATTERN.is_match(text),
    )
}

/// Classify `text`, falling back to prior user turns (most recent first) when
/// the message alone is inconclusive.
pub fn classify_with_history(text: &str, history: &[Turn]) -> ServiceScope {
    let current = classify(text);
    if current.is_known() {
        return current;
    }

    user_turns_newest_first(history)
        .map(|turn| classify(&turn.content))
        .find(|scope| scope.is_known())
        .unwrap_or(ServiceScope::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_arabic() {
        assert_eq!(classify("مشكل الكهرباء"), ServiceScope::Electricity);
        assert_eq!(classify("انقطاع المياه في الحي"), ServiceScope::Water);
        assert_eq!(classify("ماكاينش الما فالدار"), ServiceScope::Water);
        assert_eq!(classify("الضو مقطوع"), ServiceScope::Electricity);
    }

    #[test]
    fn test_classify_latin() {
        assert_eq!(classify("ma kaynach lma"), ServiceScope::Water);
        assert_eq!(classify("Pas de courant depuis ce matin"), ServiceScope::Electricity);
        assert_eq!(classify("No water and no power at home"), ServiceScope::Both);
        assert_eq!(classify("Je n'ai pas d'eau"), ServiceScope::Water);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("hello"), ServiceScope::Unknown);
        assert_eq!(classify("3701455886 / 1014871"), ServiceScope::Unknown);
        // "ما" alone is a negation, not water
        assert_eq!(classify("ما فهمتش"), ServiceScope::Unknown);
    }

    #[test]
    fn test_history_fallback_most_recent_first() {
        let history = vec![
            Turn::user("no water today"),
            Turn::assistant("Please send your contract number."),
            Turn::user("actually the electricity is out"),
            Turn::assistant("Please send your electricity contract number."),
        ];
        assert_eq!(
            classify_with_history("4801566997 / 2025982", &history),
            ServiceScope::Electricity
        );
        assert_eq!(classify_with_history("hi", &[]), ServiceScope::Unknown);
        // Current message wins over history
        assert_eq!(classify_with_history("water", &history), ServiceScope::Water);
    }

    #[test]
    fn test_history_ignores_assistant_turns() {
        let history = vec![Turn::assistant("Is it about water or electricity?")];
        assert_eq!(classify_with_history("hello", &history), ServiceScope::Unknown);
    }
}
