//! Language utilities for ISO language code handling
//!
//! The provider speaks ISO 639-1 (2-letter) codes. The CLI additionally accepts
//! ISO 639-2 (3-letter) codes and normalizes them down to 2 letters.

use anyhow::{Result, anyhow};
use isolang::Language;

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Validate a 2-letter ISO 639-1 code, returning it lowercased and trimmed
pub fn validate_language_code(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 && Language::from_639_1(&normalized_code).is_some() {
        return Ok(normalized_code);
    }

    Err(anyhow!("Invalid language code: '{}' (expected a 2-letter ISO 639-1 code)", code))
}

/// Normalize a 2- or 3-letter code to ISO 639-1
pub fn normalize_to_part1(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => validate_language_code(&normalized_code),
        3 => {
            let part2t = PART2B_TO_PART2T
                .iter()
                .find(|(part2b, _)| *part2b == normalized_code)
                .map(|(_, part2t)| *part2t)
                .unwrap_or(normalized_code.as_str());

            Language::from_639_3(part2t)
                .and_then(|lang| lang.to_639_1())
                .map(str::to_string)
                .ok_or_else(|| anyhow!("Language '{}' has no 2-letter ISO 639-1 code", code))
        }
        _ => Err(anyhow!("Invalid language code: '{}'", code)),
    }
}

/// Check if two language codes represent the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part1(code1), normalize_to_part1(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let part1 = normalize_to_part1(code)?;
    let lang = Language::from_639_1(&part1)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", part1))?;

    Ok(lang.to_name().to_string())
}
