//! Feedback Classifier: maps an average score onto a qualitative tier.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Critical,
    BelowAverage,
    Average,
    Good,
    Excellent,
}

/// Inclusive lower bounds, checked from the top.
const TIER_THRESHOLDS: &[(f64, Tier)] = &[
    (8.0, Tier::Excellent),
    (6.0, Tier::Good),
    (4.0, Tier::Average),
    (2.0, Tier::BelowAverage),
];

/// Classifies a 0–10 average. Anything below 2 (including negative or NaN input) is Critical.
pub fn classify(average: f64) -> Tier {
    TIER_THRESHOLDS
        .iter()
        .find(|(bound, _)| average >= *bound)
        .map(|(_, tier)| *tier)
        .unwrap_or(Tier::Critical)
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Critical => "Critical",
            Tier::BelowAverage => "Below average",
            Tier::Average => "Average",
            Tier::Good => "Good",
            Tier::Excellent => "Excellent",
        }
    }

    /// Feedback sentence for the organisation's overall score.
    pub fn overall_feedback(self) -> &'static str {
        match self {
            Tier::Excellent => {
                "Excellent financial health. Your organisation demonstrates strong, well-embedded financial practices across the board."
            }
            Tier::Good => {
                "Good financial health. Solid foundations are in place, with a few areas that would benefit from attention."
            }
            Tier::Average => {
                "Average financial health. Core practices exist but are inconsistent; targeted improvements will make a noticeable difference."
            }
            Tier::BelowAverage => {
                "Below-average financial health. Several fundamental practices need strengthening to reduce financial risk."
            }
            Tier::Critical => {
                "Critical financial health. Urgent action is needed to establish basic financial management practices."
            }
        }
    }

    /// Feedback sentence for a single pillar.
    pub fn pillar_feedback(self, pillar: &str) -> String {
        match self {
            Tier::Excellent => format!("{pillar} is a clear strength. Maintain current practices and review them annually."),
            Tier::Good => format!("{pillar} is in good shape, with room to refine a few practices."),
            Tier::Average => format!("{pillar} is adequate but inconsistent. Formalising your approach will lift this score."),
            Tier::BelowAverage => format!("{pillar} needs attention. Key practices are missing or rarely followed."),
            Tier::Critical => format!("{pillar} is a critical gap and should be addressed as a priority."),
        }
    }
}

/// Sentence used when no answers were submitted and no tier applies.
pub const NO_ANSWERS_FEEDBACK: &str =
    "No answers were submitted, so no score is available. Complete the assessment to receive feedback.";
