//! Approve/request-changes decision from free-text review output.
//!
//! This is a coarse lexical classifier: the text is folded (decomposed,
//! diacritics stripped, lowercased) and searched for any high-risk severity
//! word. One mention anywhere rejects the change, regardless of context.
//! Matching is by substring, so words that merely contain a risk token
//! also reject.

use regex::Regex;
use sentinel_core::{Language, ReviewEvent};
use unicode_normalization::UnicodeNormalization;

/// High-risk words in Portuguese, already folded.
pub const PORTUGUESE_RISK_WORDS: &[&str] = &["alta", "altissima", "grave", "gravissima"];

/// High-risk words in English, already folded.
pub const ENGLISH_RISK_WORDS: &[&str] = &["high", "very high", "very-high", "severe", "critical"];

/// Classifies review text into an approve/reject decision.
///
/// # Examples
///
/// ```
/// use sentinel_core::{Language, ReviewEvent};
/// use sentinel_review::decision::RiskClassifier;
///
/// let classifier = RiskClassifier::new(Language::Portuguese);
/// assert!(!classifier.approves("Classificação geral: ALTA"));
/// assert_eq!(classifier.decide("Risco baixo."), ReviewEvent::Approve);
/// ```
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    pattern: Regex,
}

impl RiskClassifier {
    /// Classifier for the risk vocabulary of `language`.
    pub fn new(language: Language) -> Self {
        let words = match language {
            Language::Portuguese => PORTUGUESE_RISK_WORDS,
            Language::English => ENGLISH_RISK_WORDS,
        };
        Self::with_words(words)
    }

    /// Classifier for an explicit word list. Words are matched literally.
    pub fn with_words(words: &[&str]) -> Self {
        let alternation = words
            .iter()
            .map(|w| regex::escape(&fold(w)))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!("(?i)(?:{alternation})"))
            .expect("escaped alternation is a valid regex");
        Self { pattern }
    }

    /// `true` when no risk word appears anywhere in `review`.
    pub fn approves(&self, review: &str) -> bool {
        !self.pattern.is_match(&fold(review))
    }

    /// The review event for `review`.
    pub fn decide(&self, review: &str) -> ReviewEvent {
        ReviewEvent::from_approval(self.approves(review))
    }
}

/// Decompose, drop combining diacritical marks (U+0300..=U+036F), lowercase.
///
/// # Examples
///
/// ```
/// use sentinel_review::decision::fold;
///
/// assert_eq!(fold("Gravíssima"), "gravissima");
/// assert_eq!(fold("ÁLTA"), "alta");
/// ```
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect::<String>()
        .to_lowercase()
}

/// Decide with the default (Portuguese) vocabulary.
///
/// Returns `true` to approve, `false` to request changes.
pub fn should_approve(review: &str) -> bool {
    RiskClassifier::new(Language::Portuguese).approves(review)
}
