use serde::{Deserialize, Serialize};

/// Direction of the latest reading against the reading immediately before it.
///
/// The labels keep the established display convention: a reading numerically
/// *lower* than the previous one is reported as [`TrendDirection::Rising`] and a
/// higher one as [`TrendDirection::Falling`]. Whether the arrow shows the
/// direction of concern or is a polarity defect is still open with product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
    NoHistory,
}

impl TrendDirection {
    pub fn arrow(&self) -> Option<&'static str> {
        match self {
            TrendDirection::Rising => Some("⬆"),
            TrendDirection::Falling => Some("⬇"),
            TrendDirection::Flat => Some("➡"),
            TrendDirection::NoHistory => None,
        }
    }
}

/// Compares `current` with `prior_newest_first[0]`.
pub fn compare_to_previous(current: f64, prior_newest_first: &[f64]) -> TrendDirection {
    let Some(previous) = prior_newest_first.first() else {
        return TrendDirection::NoHistory;
    };

    if current < *previous {
        TrendDirection::Rising
    } else if current > *previous {
        TrendDirection::Falling
    } else {
        TrendDirection::Flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_reading_is_reported_as_rising() {
        assert_eq!(compare_to_previous(4.0, &[5.0, 6.0]), TrendDirection::Rising);
    }

    #[test]
    fn higher_reading_is_reported_as_falling() {
        assert_eq!(compare_to_previous(6.0, &[5.0]), TrendDirection::Falling);
    }

    #[test]
    fn equal_reading_is_flat() {
        assert_eq!(compare_to_previous(5.0, &[5.0]), TrendDirection::Flat);
    }

    #[test]
    fn empty_series_has_no_history() {
        assert_eq!(compare_to_previous(5.0, &[]), TrendDirection::NoHistory);
        assert_eq!(TrendDirection::NoHistory.arrow(), None);
    }

    #[test]
    fn only_the_most_recent_prior_value_is_consulted() {
        assert_eq!(
            compare_to_previous(5.5, &[6.0, 1.0, 1.0]),
            TrendDirection::Rising
        );
        assert_eq!(
            compare_to_previous(5.5, &[5.0, 9.0, 9.0]),
            TrendDirection::Falling
        );
    }
}
