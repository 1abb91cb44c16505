//! Pure reference-range and trend evaluation.
//!
//! Nothing here touches storage or the network; every function takes plain
//! values and returns plain values, so evaluations can run from any number of
//! threads without coordination.

pub mod age;
pub mod bracket;
pub mod range;
pub mod report;
pub mod trend;

pub use age::age_in_months;
pub use bracket::{bracket_issues, resolve_bracket, AgeBracket, AgeLimit, BracketIssue, BracketMatch};
pub use range::{classify, RangeVerdict};
pub use report::{
    EvaluationReport, GuidelineEvaluation, ParameterEvaluation, ParameterOutcome, ReportSummary,
};
pub use trend::{compare_to_previous, TrendDirection};

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::guidelines::{Guideline, GuidelineSet};
use crate::records::domain::{Measurement, TestRecord};

/// Stateless evaluator over a shared, read-only guideline snapshot.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    guidelines: Arc<GuidelineSet>,
}

impl EvaluationEngine {
    pub fn new(guidelines: Arc<GuidelineSet>) -> Self {
        Self { guidelines }
    }

    pub fn guidelines(&self) -> &GuidelineSet {
        &self.guidelines
    }

    /// Evaluates every record parameter against every guideline.
    ///
    /// Age is taken at the record's observation date, once per call.
    pub fn evaluate(&self, record: &TestRecord, date_of_birth: NaiveDate) -> EvaluationReport {
        let age_months = age_in_months(date_of_birth, record.observed_on());

        let guidelines = self
            .guidelines
            .iter()
            .map(|guideline| evaluate_guideline(guideline, record, age_months))
            .collect();

        let report = EvaluationReport {
            record_id: record.id.clone(),
            subject_id: record.subject_id.clone(),
            test_type: record.test_type.clone(),
            age_months,
            guidelines,
        };

        debug!(
            subject = %report.subject_id,
            age_months,
            guidelines = report.guidelines.len(),
            "evaluated test record"
        );
        report
    }
}

fn evaluate_guideline(
    guideline: &Guideline,
    record: &TestRecord,
    age_months: u32,
) -> GuidelineEvaluation {
    if guideline.is_empty() {
        return GuidelineEvaluation {
            guideline: guideline.name.clone(),
            has_data: false,
            parameters: Vec::new(),
        };
    }

    let parameters = record
        .results
        .iter()
        .map(|(parameter, measurement)| {
            evaluate_parameter(guideline, parameter, measurement, age_months)
        })
        .collect();

    GuidelineEvaluation {
        guideline: guideline.name.clone(),
        has_data: true,
        parameters,
    }
}

fn evaluate_parameter(
    guideline: &Guideline,
    parameter: &str,
    measurement: &Measurement,
    age_months: u32,
) -> ParameterEvaluation {
    let outcome = match guideline.brackets(parameter) {
        None => ParameterOutcome::NoGuidelineData,
        Some(brackets) => match resolve_bracket(brackets, age_months) {
            BracketMatch::Found(bracket) => ParameterOutcome::Evaluated {
                bracket: *bracket,
                verdict: classify(measurement.value, bracket),
            },
            BracketMatch::NotFound => ParameterOutcome::AgeNotCovered,
        },
    };

    ParameterEvaluation {
        parameter: parameter.to_string(),
        value: measurement.value,
        unit: measurement.unit.clone(),
        outcome,
    }
}
