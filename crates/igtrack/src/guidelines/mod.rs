//! Named reference tables of age-bracketed normal ranges.
//!
//! Guidelines are immutable once loaded and are shared read-only between
//! evaluations, so a [`GuidelineSet`] is normally held behind an `Arc`.

mod import;

pub use import::GuidelineImportError;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evaluation::bracket::{bracket_issues, AgeBracket, AgeLimit, BracketIssue};

/// One named guideline: parameter name to its ordered bracket rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guideline {
    pub name: String,
    pub parameters: BTreeMap<String, Vec<AgeBracket>>,
}

impl Guideline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>, brackets: Vec<AgeBracket>) -> Self {
        self.parameters.insert(parameter.into(), brackets);
        self
    }

    pub fn brackets(&self, parameter: &str) -> Option<&[AgeBracket]> {
        self.parameters.get(parameter).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Data-quality diagnostics per parameter. Parameters without issues are omitted.
    pub fn validate(&self) -> BTreeMap<String, Vec<BracketIssue>> {
        self.parameters
            .iter()
            .filter_map(|(parameter, brackets)| {
                let issues = bracket_issues(brackets);
                (!issues.is_empty()).then(|| (parameter.clone(), issues))
            })
            .collect()
    }
}

/// Guideline tables in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuidelineSet {
    guidelines: Vec<Guideline>,
}

impl GuidelineSet {
    pub fn new(guidelines: Vec<Guideline>) -> Self {
        Self { guidelines }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Guideline> {
        self.guidelines.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Guideline> {
        self.guidelines.iter().find(|guideline| guideline.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.guidelines.iter().map(|g| g.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.guidelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guidelines.is_empty()
    }

    /// Keyed by guideline name, then parameter.
    pub fn validate(&self) -> BTreeMap<String, BTreeMap<String, Vec<BracketIssue>>> {
        self.guidelines
            .iter()
            .filter_map(|guideline| {
                let issues = guideline.validate();
                (!issues.is_empty()).then(|| (guideline.name.clone(), issues))
            })
            .collect()
    }

    /// Illustrative two-table set used by the demo service and tests.
    ///
    /// `Standard` covers IgA, IgM and IgG from birth; `Extended` only covers IgA
    /// and IgG and starts at six months.
    pub fn demo() -> Self {
        use AgeLimit::{Bounded, Unbounded};

        let standard = Guideline::new("Standard")
            .with_parameter(
                "IgA",
                vec![
                    AgeBracket::new(0, Bounded(12), 0.0, 0.8),
                    AgeBracket::new(12, Bounded(36), 0.2, 1.0),
                    AgeBracket::new(36, Bounded(72), 0.3, 1.5),
                    AgeBracket::new(72, Bounded(96), 0.5, 2.2),
                    AgeBracket::new(96, Bounded(120), 0.8, 3.0),
                    AgeBracket::new(120, Bounded(216), 0.7, 3.5),
                    AgeBracket::new(216, Unbounded, 0.7, 4.0),
                ],
            )
            .with_parameter(
                "IgM",
                vec![
                    AgeBracket::new(0, Bounded(12), 0.2, 1.0),
                    AgeBracket::new(12, Bounded(72), 0.4, 1.8),
                    AgeBracket::new(72, Unbounded, 0.4, 2.3),
                ],
            )
            .with_parameter(
                "IgG",
                vec![
                    AgeBracket::new(0, Bounded(12), 2.5, 9.0),
                    AgeBracket::new(12, Bounded(72), 4.5, 12.0),
                    AgeBracket::new(72, Bounded(216), 6.0, 15.0),
                    AgeBracket::new(216, Unbounded, 7.0, 16.0),
                ],
            );

        let extended = Guideline::new("Extended")
            .with_parameter(
                "IgA",
                vec![
                    AgeBracket::new(6, Bounded(60), 0.1, 1.3),
                    AgeBracket::new(60, Bounded(144), 0.6, 2.6),
                    AgeBracket::new(144, Unbounded, 0.8, 3.8),
                ],
            )
            .with_parameter(
                "IgG",
                vec![
                    AgeBracket::new(6, Bounded(60), 4.0, 11.5),
                    AgeBracket::new(60, Bounded(144), 6.5, 14.5),
                    AgeBracket::new(144, Unbounded, 7.0, 16.0),
                ],
            );

        Self::new(vec![standard, extended])
    }
}
