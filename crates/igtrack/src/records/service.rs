use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::catalog::ParameterCatalog;
use super::domain::{RecordId, SubjectId, TestRecord, Viewer};
use super::history::{build_history, RecordHistory};
use super::repository::{
    GuidelineProvider, ProfileProvider, RecordQuery, RecordSummaryView, RepositoryError,
    TestRecordProvider,
};
use super::validation::{RecordDraft, ValidationError};
use crate::evaluation::{EvaluationEngine, EvaluationReport};

/// Service composing the providers, the entry catalog, and the evaluation engine.
pub struct TestResultService<P, R, G> {
    profiles: Arc<P>,
    records: Arc<R>,
    guidelines: Arc<G>,
    catalog: Arc<ParameterCatalog>,
}

impl<P, R, G> TestResultService<P, R, G>
where
    P: ProfileProvider + 'static,
    R: TestRecordProvider + 'static,
    G: GuidelineProvider + 'static,
{
    pub fn new(
        profiles: Arc<P>,
        records: Arc<R>,
        guidelines: Arc<G>,
        catalog: ParameterCatalog,
    ) -> Self {
        Self {
            profiles,
            records,
            guidelines,
            catalog: Arc::new(catalog),
        }
    }

    pub fn catalog(&self) -> &ParameterCatalog {
        &self.catalog
    }

    /// Validate and store a new test record.
    pub fn submit(&self, viewer: &Viewer, draft: RecordDraft) -> Result<TestRecord, ServiceError> {
        if !viewer.can_access(&draft.subject_id) {
            warn!(viewer = %viewer.subject_id, subject = %draft.subject_id, "rejected foreign submission");
            return Err(ServiceError::Forbidden("submit records for another subject"));
        }

        let record = draft.validate(&self.catalog)?;
        let stored = self.records.insert(record)?;

        info!(
            record = ?stored.id,
            subject = %stored.subject_id,
            parameters = stored.results.len(),
            "stored test record"
        );
        Ok(stored)
    }

    /// A subject's records, newest first.
    pub fn list_records(
        &self,
        viewer: &Viewer,
        subject_id: &SubjectId,
    ) -> Result<Vec<RecordSummaryView>, ServiceError> {
        if !viewer.can_access(subject_id) {
            return Err(RepositoryError::Unauthorized.into());
        }

        let records = self
            .records
            .query(&RecordQuery::for_subject(subject_id.clone()))?;
        Ok(records.iter().map(RecordSummaryView::from).collect())
    }

    /// Evaluate a stored record against every guideline.
    pub fn guideline_report(
        &self,
        viewer: &Viewer,
        record_id: &RecordId,
    ) -> Result<EvaluationReport, ServiceError> {
        let record = self.authorized_record(viewer, record_id)?;
        let profile = self
            .profiles
            .profile(&record.subject_id)?
            .ok_or(RepositoryError::NotFound)?;

        let engine = EvaluationEngine::new(self.guidelines.guidelines()?);
        Ok(engine.evaluate(&record, profile.date_of_birth))
    }

    /// Previous values of every parameter of `record_id`, of the same test type,
    /// observed at or before it.
    pub fn history(
        &self,
        viewer: &Viewer,
        record_id: &RecordId,
    ) -> Result<RecordHistory, ServiceError> {
        let record = self.authorized_record(viewer, record_id)?;
        let query = RecordQuery::for_subject(record.subject_id.clone())
            .test_type(record.test_type.clone())
            .observed_until(record.observed_at);
        let related = self.records.query(&query)?;

        Ok(build_history(&record, &related))
    }

    /// Admin patient roster: everyone but the viewer, filtered by name.
    pub fn roster(
        &self,
        viewer: &Viewer,
        search: Option<&str>,
    ) -> Result<Vec<RosterEntry>, ServiceError> {
        if !viewer.is_admin() {
            return Err(ServiceError::Forbidden("view the patient roster"));
        }

        let needle = search
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty());

        let mut entries: Vec<RosterEntry> = self
            .profiles
            .profiles()?
            .into_iter()
            .filter(|profile| profile.id != viewer.subject_id)
            .filter(|profile| {
                needle
                    .as_deref()
                    .map_or(true, |needle| profile.name.to_lowercase().contains(needle))
            })
            .map(|profile| RosterEntry {
                subject_id: profile.id,
                name: profile.name,
                email: profile.email,
            })
            .collect();
        entries.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(entries)
    }

    fn authorized_record(
        &self,
        viewer: &Viewer,
        record_id: &RecordId,
    ) -> Result<TestRecord, ServiceError> {
        let record = self
            .records
            .fetch(record_id)?
            .ok_or(RepositoryError::NotFound)?;

        if !viewer.can_access(&record.subject_id) {
            warn!(viewer = %viewer.subject_id, record = %record_id, "unauthorized record access");
            return Err(RepositoryError::Unauthorized.into());
        }
        Ok(record)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub subject_id: SubjectId,
    pub name: String,
    pub email: String,
}

/// Error raised by the test result service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("not permitted to {0}")]
    Forbidden(&'static str),
}
