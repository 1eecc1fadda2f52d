use serde::Serialize;

/// Confidence band of a BLEU score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceLevel {
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Medium-High")]
    MediumHigh,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "Low-Medium")]
    LowMedium,
    #[serde(rename = "Low")]
    Low,
}

impl ConfidenceLevel {
    /// Band a score: >=0.8, >=0.6, >=0.4, >=0.2, below
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::High
        } else if score >= 0.6 {
            Self::MediumHigh
        } else if score >= 0.4 {
            Self::Medium
        } else if score >= 0.2 {
            Self::LowMedium
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::MediumHigh => "Medium-High",
            Self::Medium => "Medium",
            Self::LowMedium => "Low-Medium",
            Self::Low => "Low",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::High => "Excellent translation quality - minimal loss of meaning",
            Self::MediumHigh => "Good translation quality - some minor differences",
            Self::Medium => "Moderate translation quality - noticeable differences",
            Self::LowMedium => "Poor translation quality - significant differences",
            Self::Low => "Very poor translation quality - major loss of meaning",
        }
    }

    /// Number of stars out of five
    pub fn stars(&self) -> usize {
        match self {
            Self::High => 5,
            Self::MediumHigh => 4,
            Self::Medium => 3,
            Self::LowMedium => 2,
            Self::Low => 1,
        }
    }

    /// Star rating such as `★★★☆☆`
    pub fn rating(&self) -> String {
        let filled = self.stars();
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }

    pub fn recommendations(&self) -> &'static str {
        match self {
            Self::High => "Translation quality is excellent. No action needed.",
            Self::MediumHigh => "Translation quality is good. Minor review recommended.",
            Self::Medium => "Translation quality is moderate. Consider manual review.",
            Self::LowMedium => "Translation quality is poor. Manual correction recommended.",
            Self::Low => "Translation quality is very poor. Complete retranslation advised.",
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Quality estimate of a round trip, derived from its BLEU score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAssessment {
    pub bleu_score: f64,
    /// Score as a percentage with two decimals, e.g. `87.50%`
    pub bleu_percentage: String,
    pub confidence_level: ConfidenceLevel,
    pub description: String,
    pub quality_rating: String,
    pub recommendations: String,
}

impl QualityAssessment {
    /// Build the assessment for a score
    pub fn from_score(bleu_score: f64) -> Self {
        let level = ConfidenceLevel::from_score(bleu_score);
        Self {
            bleu_score,
            bleu_percentage: format!("{:.2}%", bleu_score * 100.0),
            confidence_level: level,
            description: level.description().to_string(),
            quality_rating: level.rating(),
            recommendations: level.recommendations().to_string(),
        }
    }
}
