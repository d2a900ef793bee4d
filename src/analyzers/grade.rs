use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered confidence that a brand is the airline's Basic Economy product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    #[serde(rename = "Very Low")]
    VeryLow,
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl Confidence {
    /// Highest level first, the order reports list them in.
    pub const DESCENDING: [Confidence; 5] = [
        Confidence::VeryHigh,
        Confidence::High,
        Confidence::Medium,
        Confidence::Low,
        Confidence::VeryLow,
    ];

    /// Converts a 0–100 score into a confidence level.
    ///
    /// | Range       | Level     |
    /// |-------------|-----------|
    /// | >= 80       | Very High |
    /// | >= 70       | High      |
    /// | >= 50       | Medium    |
    /// | >= 30       | Low       |
    /// | < 30        | Very Low  |
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => Confidence::VeryHigh,
            s if s >= 70.0 => Confidence::High,
            s if s >= 50.0 => Confidence::Medium,
            s if s >= 30.0 => Confidence::Low,
            _ => Confidence::VeryLow,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Confidence::VeryHigh => "Very High",
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
            Confidence::VeryLow => "Very Low",
        }
    }

    /// High or Very High.
    pub fn is_high(self) -> bool {
        self >= Confidence::High
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
