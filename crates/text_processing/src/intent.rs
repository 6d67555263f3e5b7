//! Payment intent detection
//!
//! Recognises an explicit wish to pay now. Mentioning a bill, a balance or a
//! contract number is not enough; the customer has to say they want to pay.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static PAY_NOW_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // English
        r"(?i)\bpay\s+(?:it\s+|this\s+)?(?:now|right\s+now|immediately|today)\b",
        r"(?i)\b(?:want|wanna|would\s+like|'d\s+like|like|need|going)\s+to\s+pay\b",
        r"(?i)\b(?:let\s+me|i\s+will|i'll|can\s+i)\s+pay\b",
        r"(?i)\bpay\s+(?:my|the)\s+(?:bill|invoice|balance)\b",
        // French
        r"(?i)\bpayer\s+(?:maintenant|tout\s+de\s+suite|aujourd'hui|en\s+ligne)\b",
        r"(?i)\b(?:veux|voudrais|souhaite|aimerais|vais)\s+(?:payer|régler|regler)\b",
        r"(?i)\b(?:payer|régler|regler)\s+(?:ma|la|mes|les)\s+factures?\b",
        // Arabic
        r"(?:أريد|اريد|أود|نريد)\s+(?:أن\s+)?(?:أدفع|ادفع|الدفع|تسديد|أسدد|اسدد|نخلص)",
        r"(?:الدفع|أدفع|ادفع|تسديد)\s+(?:الآن|الان|دابا)",
        // Darija
        r"بغيت\s+(?:ن|نـ)?خلص",
        r"نخلص\s+(?:دابا|الفاتورة|الفاكتورة)",
        r"(?i)\bbghit\s+n?kh[ae]?ll?[ae]?s",
        r"(?i)\bnkh[ae]?ll?[ae]?s+\s+(?:daba|lfactura|lfatoura)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static NEGATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:don't|dont|do\s+not|won't|will\s+not|cannot|can't|not\s+going)\s+(?:want\s+to\s+|going\s+to\s+)?pay\b",
        r"(?i)\bne\s+(?:veux|voudrais|vais|peux)\s+pas\s+(?:payer|régler|regler)\b",
        r"(?:لا\s+أريد|لا\s+اريد|ما\s+بغيتش|مابغيتش)",
        r"(?i)\bma\s*bghitch\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Result of payment-intent detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentIntent {
    pub detected: bool,
    pub negated: bool,
}

/// Explicit "pay now" detector
#[derive(Debug, Default, Clone, Copy)]
pub struct PaymentIntentDetector;

impl PaymentIntentDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, text: &str) -> PaymentIntent {
        let negated = NEGATION_PATTERNS.iter().any(|re| re.is_match(text));
        let detected = !negated && PAY_NOW_PATTERNS.iter().any(|re| re.is_match(text));
        if detected {
            tracing::debug!("Pay-now intent detected");
        }
        PaymentIntent { detected, negated }
    }

    pub fn wants_to_pay(&self, text: &str) -> bool {
        self.detect(text).detected
    }
}
