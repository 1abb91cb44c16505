use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{RecordId, SubjectId, SubjectProfile, TestRecord};
use crate::guidelines::GuidelineSet;

/// Source of subject profiles (date of birth and roster fields).
pub trait ProfileProvider: Send + Sync {
    fn profile(&self, id: &SubjectId) -> Result<Option<SubjectProfile>, RepositoryError>;
    fn profiles(&self) -> Result<Vec<SubjectProfile>, RepositoryError>;
}

/// Storage abstraction for test records so the service can be exercised in isolation.
pub trait TestRecordProvider: Send + Sync {
    /// Stores a new record and returns it with its assigned id.
    fn insert(&self, record: TestRecord) -> Result<TestRecord, RepositoryError>;
    fn fetch(&self, id: &RecordId) -> Result<Option<TestRecord>, RepositoryError>;
    /// Matching records, newest observation first.
    fn query(&self, query: &RecordQuery) -> Result<Vec<TestRecord>, RepositoryError>;
}

/// Read-only snapshot of the provisioned guideline tables.
pub trait GuidelineProvider: Send + Sync {
    fn guidelines(&self) -> Result<Arc<GuidelineSet>, RepositoryError>;
}

/// Filter applied by [`TestRecordProvider::query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub subject_id: SubjectId,
    pub test_type: Option<String>,
    /// Inclusive upper bound on `observed_at`.
    pub observed_until: Option<DateTime<Utc>>,
}

impl RecordQuery {
    pub fn for_subject(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            test_type: None,
            observed_until: None,
        }
    }

    pub fn test_type(mut self, test_type: impl Into<String>) -> Self {
        self.test_type = Some(test_type.into());
        self
    }

    pub fn observed_until(mut self, until: DateTime<Utc>) -> Self {
        self.observed_until = Some(until);
        self
    }

    pub fn matches(&self, record: &TestRecord) -> bool {
        record.subject_id == self.subject_id
            && self
                .test_type
                .as_ref()
                .map_or(true, |test_type| &record.test_type == test_type)
            && self
                .observed_until
                .map_or(true, |until| record.observed_at <= until)
    }
}

/// Error enumeration for provider failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("caller is not allowed to read this record")]
    Unauthorized,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Compact listing entry for test lists and the admin patient view.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSummaryView {
    pub record_id: Option<RecordId>,
    pub test_type: String,
    pub observed_at: DateTime<Utc>,
    pub parameters: usize,
    /// First parameter by name, shown as a preview.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl From<&TestRecord> for RecordSummaryView {
    fn from(record: &TestRecord) -> Self {
        let preview = record
            .results
            .iter()
            .next()
            .map(|(name, measurement)| format!("{name}: {} {}", measurement.value, measurement.unit));

        Self {
            record_id: record.id.clone(),
            test_type: record.test_type.clone(),
            observed_at: record.observed_at,
            parameters: record.results.len(),
            preview,
        }
    }
}
