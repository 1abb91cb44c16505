use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::bracket::AgeBracket;
use super::range::RangeVerdict;
use crate::records::domain::{RecordId, SubjectId};

/// What a single guideline says about a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParameterOutcome {
    Evaluated {
        bracket: AgeBracket,
        verdict: RangeVerdict,
    },
    /// The guideline has rows for the parameter, but none covers the subject's age.
    AgeNotCovered,
    /// The guideline has no rows for the parameter at all.
    NoGuidelineData,
}

impl ParameterOutcome {
    pub fn verdict(&self) -> Option<RangeVerdict> {
        match self {
            ParameterOutcome::Evaluated { verdict, .. } => Some(*verdict),
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            ParameterOutcome::Evaluated { bracket, verdict } => format!(
                "{} ({} - {})",
                verdict.label(),
                bracket.min_val,
                bracket.max_val
            ),
            ParameterOutcome::AgeNotCovered => "no bracket for this age".to_string(),
            ParameterOutcome::NoGuidelineData => "no guideline data for parameter".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEvaluation {
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    pub outcome: ParameterOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidelineEvaluation {
    pub guideline: String,
    /// False when the guideline table is empty.
    pub has_data: bool,
    pub parameters: Vec<ParameterEvaluation>,
}

impl GuidelineEvaluation {
    pub fn parameter(&self, name: &str) -> Option<&ParameterEvaluation> {
        self.parameters.iter().find(|entry| entry.parameter == name)
    }
}

/// Evaluation of one record against every loaded guideline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    pub subject_id: SubjectId,
    pub test_type: String,
    pub age_months: u32,
    pub guidelines: Vec<GuidelineEvaluation>,
}

impl EvaluationReport {
    pub fn guideline(&self, name: &str) -> Option<&GuidelineEvaluation> {
        self.guidelines.iter().find(|entry| entry.guideline == name)
    }

    pub fn outcome(&self, guideline: &str, parameter: &str) -> Option<&ParameterOutcome> {
        self.guideline(guideline)
            .and_then(|entry| entry.parameter(parameter))
            .map(|entry| &entry.outcome)
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for entry in self.guidelines.iter().flat_map(|g| &g.parameters) {
            match &entry.outcome {
                ParameterOutcome::Evaluated { verdict, .. } => {
                    *summary.verdicts.entry(*verdict).or_default() += 1;
                }
                ParameterOutcome::AgeNotCovered => summary.age_not_covered += 1,
                ParameterOutcome::NoGuidelineData => summary.no_guideline_data += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub verdicts: BTreeMap<RangeVerdict, usize>,
    pub age_not_covered: usize,
    pub no_guideline_data: usize,
}

impl ReportSummary {
    pub fn count(&self, verdict: RangeVerdict) -> usize {
        self.verdicts.get(&verdict).copied().unwrap_or(0)
    }

    pub fn out_of_range(&self) -> usize {
        self.count(RangeVerdict::Below) + self.count(RangeVerdict::Above)
    }
}
