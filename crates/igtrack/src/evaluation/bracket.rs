use serde::{Deserialize, Serialize};

/// Exclusive upper age bound of a bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum AgeLimit {
    Bounded(u32),
    #[default]
    Unbounded,
}

impl AgeLimit {
    pub fn admits(&self, age_months: u32) -> bool {
        match self {
            AgeLimit::Bounded(limit) => age_months < *limit,
            AgeLimit::Unbounded => true,
        }
    }
}

impl From<Option<u32>> for AgeLimit {
    fn from(value: Option<u32>) -> Self {
        value.map(AgeLimit::Bounded).unwrap_or(AgeLimit::Unbounded)
    }
}

impl From<AgeLimit> for Option<u32> {
    fn from(value: AgeLimit) -> Self {
        match value {
            AgeLimit::Bounded(limit) => Some(limit),
            AgeLimit::Unbounded => None,
        }
    }
}

/// One row of a guideline table: an age interval in months with its normal range.
///
/// Field names follow the stored guideline documents, so `max_age_month: null`
/// deserializes as [`AgeLimit::Unbounded`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeBracket {
    pub min_age_months: u32,
    #[serde(rename = "max_age_month", alias = "max_age_months", default)]
    pub max_age_months: AgeLimit,
    pub min_val: f64,
    pub max_val: f64,
}

impl AgeBracket {
    pub fn new(min_age_months: u32, max_age_months: AgeLimit, min_val: f64, max_val: f64) -> Self {
        Self {
            min_age_months,
            max_age_months,
            min_val,
            max_val,
        }
    }

    pub fn covers(&self, age_months: u32) -> bool {
        age_months >= self.min_age_months && self.max_age_months.admits(age_months)
    }

    fn overlaps(&self, other: &AgeBracket) -> bool {
        let self_end = Option::<u32>::from(self.max_age_months).unwrap_or(u32::MAX);
        let other_end = Option::<u32>::from(other.max_age_months).unwrap_or(u32::MAX);
        self.min_age_months < other_end && other.min_age_months < self_end
    }
}

/// Result of looking up the bracket that applies to an age.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BracketMatch<'a> {
    Found(&'a AgeBracket),
    NotFound,
}

impl<'a> BracketMatch<'a> {
    pub fn found(self) -> Option<&'a AgeBracket> {
        match self {
            BracketMatch::Found(bracket) => Some(bracket),
            BracketMatch::NotFound => None,
        }
    }
}

/// Returns the first bracket in list order that covers `age_months`.
///
/// Gaps in coverage resolve to [`BracketMatch::NotFound`]; no nearest bracket is
/// substituted. Overlapping lists resolve to the earliest covering entry.
pub fn resolve_bracket(brackets: &[AgeBracket], age_months: u32) -> BracketMatch<'_> {
    brackets
        .iter()
        .find(|bracket| bracket.covers(age_months))
        .map(BracketMatch::Found)
        .unwrap_or(BracketMatch::NotFound)
}

/// Data-quality problem found in a parameter's bracket list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BracketIssue {
    /// Two rows cover at least one common age.
    Overlap { first: usize, second: usize },
    /// The age interval is empty (`max <= min`).
    EmptyAgeInterval { index: usize },
    /// `min_val` is greater than `max_val`.
    InvertedRange { index: usize },
}

/// Reports overlapping, empty, or inverted rows. Resolution is unaffected.
pub fn bracket_issues(brackets: &[AgeBracket]) -> Vec<BracketIssue> {
    let mut issues = Vec::new();

    for (index, bracket) in brackets.iter().enumerate() {
        if let AgeLimit::Bounded(limit) = bracket.max_age_months {
            if limit <= bracket.min_age_months {
                issues.push(BracketIssue::EmptyAgeInterval { index });
            }
        }
        if bracket.min_val > bracket.max_val {
            issues.push(BracketIssue::InvertedRange { index });
        }
    }

    for (first, left) in brackets.iter().enumerate() {
        for (offset, right) in brackets[first + 1..].iter().enumerate() {
            if left.overlaps(right) {
                issues.push(BracketIssue::Overlap {
                    first,
                    second: first + 1 + offset,
                });
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gapless() -> Vec<AgeBracket> {
        vec![
            AgeBracket::new(0, AgeLimit::Bounded(12), 0.0, 0.8),
            AgeBracket::new(12, AgeLimit::Bounded(60), 0.2, 1.5),
            AgeBracket::new(60, AgeLimit::Bounded(120), 0.5, 2.5),
            AgeBracket::new(120, AgeLimit::Unbounded, 0.7, 4.0),
        ]
    }

    #[test]
    fn gapless_list_matches_exactly_one_bracket_per_age() {
        let brackets = gapless();
        for age in 0..400 {
            let matching = brackets.iter().filter(|b| b.covers(age)).count();
            assert_eq!(matching, 1, "age {age} should match exactly one bracket");
            assert!(matches!(
                resolve_bracket(&brackets, age),
                BracketMatch::Found(_)
            ));
        }
    }

    #[test]
    fn bounds_are_half_open() {
        let brackets = gapless();
        let found = resolve_bracket(&brackets, 12).found().expect("bracket at 12");
        assert_eq!(found.min_age_months, 12);
        let found = resolve_bracket(&brackets, 11).found().expect("bracket at 11");
        assert_eq!(found.min_age_months, 0);
    }

    #[test]
    fn gap_in_coverage_is_not_found() {
        let brackets = vec![
            AgeBracket::new(0, AgeLimit::Bounded(12), 0.0, 0.8),
            AgeBracket::new(24, AgeLimit::Unbounded, 0.2, 1.5),
        ];
        assert_eq!(resolve_bracket(&brackets, 18), BracketMatch::NotFound);
        assert_eq!(resolve_bracket(&[], 18), BracketMatch::NotFound);
    }

    #[test]
    fn overlapping_brackets_resolve_to_first_in_list_order() {
        let brackets = vec![
            AgeBracket::new(0, AgeLimit::Bounded(36), 1.0, 2.0),
            AgeBracket::new(24, AgeLimit::Bounded(48), 5.0, 6.0),
        ];
        let found = resolve_bracket(&brackets, 30).found().expect("overlap match");
        assert_eq!(found.min_val, 1.0);
        assert_eq!(
            bracket_issues(&brackets),
            vec![BracketIssue::Overlap {
                first: 0,
                second: 1
            }]
        );
    }

    #[test]
    fn issues_flag_inverted_and_empty_rows() {
        let brackets = vec![
            AgeBracket::new(10, AgeLimit::Bounded(10), 1.0, 2.0),
            AgeBracket::new(10, AgeLimit::Bounded(20), 3.0, 2.0),
        ];
        let issues = bracket_issues(&brackets);
        assert!(issues.contains(&BracketIssue::EmptyAgeInterval { index: 0 }));
        assert!(issues.contains(&BracketIssue::InvertedRange { index: 1 }));
        assert!(!issues
            .iter()
            .any(|issue| matches!(issue, BracketIssue::Overlap { .. })));
    }

    #[test]
    fn gapless_list_has_no_issues() {
        assert!(bracket_issues(&gapless()).is_empty());
    }

    #[test]
    fn null_upper_bound_deserializes_as_unbounded() {
        let bracket: AgeBracket = serde_json::from_str(
            r#"{"min_age_months": 96, "max_age_month": null, "min_val": 0.8, "max_val": 3.0}"#,
        )
        .expect("bracket parses");
        assert_eq!(bracket.max_age_months, AgeLimit::Unbounded);
        assert!(bracket.covers(10_000));

        let bounded: AgeBracket = serde_json::from_str(
            r#"{"min_age_months": 96, "max_age_month": 120, "min_val": 0.8, "max_val": 3.0}"#,
        )
        .expect("bracket parses");
        assert_eq!(bounded.max_age_months, AgeLimit::Bounded(120));
    }
}
