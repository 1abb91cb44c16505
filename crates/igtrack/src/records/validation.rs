use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{ParameterCatalog, DEFAULT_TEST_TYPE};
use super::domain::{Measurement, SubjectId, TestRecord};

/// Raw entry as typed by the user; values are still text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub subject_id: SubjectId,
    pub observed_at: DateTime<Utc>,
    #[serde(default = "default_test_type")]
    pub test_type: String,
    pub results: BTreeMap<String, String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_test_type() -> String {
    DEFAULT_TEST_TYPE.to_string()
}

/// Rejection raised before a draft becomes a [`TestRecord`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("subject id must not be empty")]
    EmptySubject,
    #[error("test record contains no results")]
    EmptyResults,
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("{parameter}: '{raw}' is not a number")]
    NotNumeric { parameter: String, raw: String },
    #[error("{parameter}: value must be finite")]
    NotFinite { parameter: String },
    #[error("{parameter}: value {value} must not be negative")]
    Negative { parameter: String, value: f64 },
}

impl RecordDraft {
    /// Parses every non-blank value and attaches catalog units and ranges.
    ///
    /// Blank entries are treated as "not measured" and skipped; anything else
    /// that fails to parse rejects the whole draft.
    pub fn validate(self, catalog: &ParameterCatalog) -> Result<TestRecord, ValidationError> {
        if self.subject_id.0.trim().is_empty() {
            return Err(ValidationError::EmptySubject);
        }

        let mut results = BTreeMap::new();
        for (parameter, raw) in self.results {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let known = catalog
                .get(&parameter)
                .ok_or_else(|| ValidationError::UnknownParameter(parameter.clone()))?;

            let value: f64 = trimmed.parse().map_err(|_| ValidationError::NotNumeric {
                parameter: parameter.clone(),
                raw: raw.clone(),
            })?;
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { parameter });
            }
            if value < 0.0 {
                return Err(ValidationError::Negative { parameter, value });
            }

            results.insert(
                parameter,
                Measurement {
                    value,
                    unit: known.unit.clone(),
                    reference_range: known.reference_range,
                },
            );
        }

        if results.is_empty() {
            return Err(ValidationError::EmptyResults);
        }

        let notes = self
            .notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());

        Ok(TestRecord {
            id: None,
            subject_id: self.subject_id,
            observed_at: self.observed_at,
            test_type: self.test_type,
            results,
            notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(values: &[(&str, &str)]) -> RecordDraft {
        RecordDraft {
            subject_id: SubjectId("patient-1".to_string()),
            observed_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
            test_type: DEFAULT_TEST_TYPE.to_string(),
            results: values
                .iter()
                .map(|(name, raw)| (name.to_string(), raw.to_string()))
                .collect(),
            notes: Some("  ".to_string()),
        }
    }

    #[test]
    fn valid_draft_attaches_units_and_reference_ranges() {
        let catalog = ParameterCatalog::immunoglobulin_panel();
        let record = draft(&[("IgA", " 3.5 "), ("IgG", "9"), ("IgM", "")])
            .validate(&catalog)
            .expect("draft validates");

        assert!(record.id.is_none());
        assert_eq!(record.results.len(), 2);
        let iga = record.results.get("IgA").expect("IgA kept");
        assert_eq!(iga.value, 3.5);
        assert_eq!(iga.unit, "mg/dL");
        assert!(iga.reference_range.is_some());
        assert!(record.notes.is_none());
    }

    #[test]
    fn non_numeric_value_is_rejected_not_coerced() {
        let catalog = ParameterCatalog::immunoglobulin_panel();
        let err = draft(&[("IgA", "3,5x")])
            .validate(&catalog)
            .expect_err("non-numeric rejected");
        assert_eq!(
            err,
            ValidationError::NotNumeric {
                parameter: "IgA".to_string(),
                raw: "3,5x".to_string()
            }
        );
    }

    #[test]
    fn negative_and_non_finite_values_are_rejected() {
        let catalog = ParameterCatalog::immunoglobulin_panel();
        assert!(matches!(
            draft(&[("IgG", "-0.1")]).validate(&catalog),
            Err(ValidationError::Negative { .. })
        ));
        assert!(matches!(
            draft(&[("IgG", "NaN")]).validate(&catalog),
            Err(ValidationError::NotFinite { .. })
        ));
        assert!(matches!(
            draft(&[("IgG", "inf")]).validate(&catalog),
            Err(ValidationError::NotFinite { .. })
        ));
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let catalog = ParameterCatalog::immunoglobulin_panel();
        let err = draft(&[("IgE", "1.0")])
            .validate(&catalog)
            .expect_err("IgE not in catalog");
        assert_eq!(err, ValidationError::UnknownParameter("IgE".to_string()));
    }

    #[test]
    fn all_blank_values_leave_an_empty_record() {
        let catalog = ParameterCatalog::immunoglobulin_panel();
        let err = draft(&[("IgA", ""), ("IgM", "   ")])
            .validate(&catalog)
            .expect_err("nothing measured");
        assert_eq!(err, ValidationError::EmptyResults);
    }

    #[test]
    fn blank_subject_is_rejected() {
        let catalog = ParameterCatalog::immunoglobulin_panel();
        let mut draft = draft(&[("IgA", "1.0")]);
        draft.subject_id = SubjectId(" ".to_string());
        assert_eq!(
            draft.validate(&catalog),
            Err(ValidationError::EmptySubject)
        );
    }
}
