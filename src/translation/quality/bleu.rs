/*!
 * BLEU scoring of a back-translation against its original text.
 *
 * Plain modified n-gram precision over lowercase word tokens, combined by a
 * geometric mean and a length-based penalty.
 */

use std::collections::HashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::assessment::{ConfidenceLevel, QualityAssessment};

/// Default highest n-gram order
pub const DEFAULT_MAX_NGRAMS: usize = 4;

/// Anything that is neither a word character nor whitespace
static NON_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\w\s]").unwrap()
});

/// BLEU scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BleuScorer {
    max_ngrams: usize,
}

impl Default for BleuScorer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NGRAMS)
    }
}

impl BleuScorer {
    /// Create a scorer; a zero order falls back to the default
    pub fn new(max_ngrams: usize) -> Self {
        Self {
            max_ngrams: if max_ngrams == 0 { DEFAULT_MAX_NGRAMS } else { max_ngrams },
        }
    }

    /// Highest n-gram order considered
    pub fn max_ngrams(&self) -> usize {
        self.max_ngrams
    }

    /// Score `candidate` against `reference`.
    ///
    /// Returns 0 when either side is blank. The result is usually in [0, 1] but
    /// the brevity penalty can push it above 1 for short candidates.
    pub fn calculate_bleu(&self, reference: &str, candidate: &str) -> f64 {
        if reference.trim().is_empty() || candidate.trim().is_empty() {
            return 0.0;
        }

        let reference_tokens = tokenize(reference);
        let candidate_tokens = tokenize(candidate);

        if reference_tokens.is_empty() || candidate_tokens.is_empty() {
            return 0.0;
        }

        let highest_order = self.max_ngrams.min(candidate_tokens.len());
        let mut precision = 1.0;

        for n in 1..=highest_order {
            let candidate_ngrams = ngrams(&candidate_tokens, n);
            if candidate_ngrams.is_empty() {
                continue;
            }

            let mut remaining: HashMap<String, usize> = HashMap::new();
            for ngram in ngrams(&reference_tokens, n) {
                *remaining.entry(ngram).or_insert(0) += 1;
            }

            let mut matches = 0usize;
            for ngram in &candidate_ngrams {
                if let Some(count) = remaining.get_mut(ngram) {
                    if *count > 0 {
                        matches += 1;
                        *count -= 1;
                    }
                }
            }

            precision *= matches as f64 / candidate_ngrams.len() as f64;
        }

        let precision = precision.powf(1.0 / self.max_ngrams as f64);
        precision * brevity_penalty(reference_tokens.len(), candidate_tokens.len())
    }

    /// Score and band a back-translation
    pub fn assess(&self, original: &str, back_translated: &str) -> QualityAssessment {
        let score = self.calculate_bleu(original, back_translated);
        QualityAssessment::from_score(score)
    }

    /// Multi-line human readable report of a round trip
    pub fn detailed_report(&self, original: &str, intermediate: &str, back_translated: &str) -> String {
        let assessment = self.assess(original, back_translated);
        let level: ConfidenceLevel = assessment.confidence_level;

        let lines = [
            "=== TRANSLATION QUALITY REPORT ===".to_string(),
            String::new(),
            format!("Original Text Length: {} characters", original.chars().count()),
            format!("Intermediate Text Length: {} characters", intermediate.chars().count()),
            format!("Back-translated Text Length: {} characters", back_translated.chars().count()),
            String::new(),
            format!("BLEU Score: {}", assessment.bleu_percentage),
            format!("Confidence Level: {}", level),
            format!("Quality Rating: {}", assessment.quality_rating),
            String::new(),
            format!("Assessment: {}", assessment.description),
            String::new(),
            format!("Recommendations: {}", assessment.recommendations),
            String::new(),
            "=== TEXT COMPARISON ===".to_string(),
            format!("Original: {}", truncate(original, 100)),
            format!("Back-translated: {}", truncate(back_translated, 100)),
            "=".repeat(50),
        ];

        lines.join("\n")
    }
}

/// Lowercase word tokens; punctuation acts as a separator
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_WORD
        .replace_all(&lowered, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Length penalty: 1 when the candidate is at least as long as the reference,
/// `exp(reference / candidate)` otherwise.
pub fn brevity_penalty(reference_length: usize, candidate_length: usize) -> f64 {
    if candidate_length >= reference_length {
        return 1.0;
    }
    if candidate_length == 0 {
        return 0.0;
    }
    (reference_length as f64 / candidate_length as f64).exp()
}

fn ngrams(tokens: &[String], n: usize) -> Vec<String> {
    if n == 0 || tokens.len() < n {
        return Vec::new();
    }
    tokens.windows(n).map(|window| window.join(" ")).collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}
