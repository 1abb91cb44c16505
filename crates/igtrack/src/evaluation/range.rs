use serde::{Deserialize, Serialize};

use super::bracket::AgeBracket;

/// Position of a measured value relative to a bracket's normal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeVerdict {
    Below,
    Normal,
    Above,
}

impl RangeVerdict {
    pub fn label(&self) -> &'static str {
        match self {
            RangeVerdict::Below => "below range",
            RangeVerdict::Normal => "within range",
            RangeVerdict::Above => "above range",
        }
    }

    pub fn arrow(&self) -> char {
        match self {
            RangeVerdict::Below => '↓',
            RangeVerdict::Normal => '→',
            RangeVerdict::Above => '↑',
        }
    }
}

/// Both bounds count as normal.
pub fn classify(value: f64, bracket: &AgeBracket) -> RangeVerdict {
    if value < bracket.min_val {
        RangeVerdict::Below
    } else if value > bracket.max_val {
        RangeVerdict::Above
    } else {
        RangeVerdict::Normal
    }
}
