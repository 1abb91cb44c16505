use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::guidelines::GuidelineSet;
use crate::records::domain::{Role, SubjectId, SubjectProfile, TestRecord, Viewer};
use crate::records::memory::InMemoryStore;
use crate::records::repository::{
    GuidelineProvider, ProfileProvider, RecordQuery, RepositoryError, TestRecordProvider,
};
use crate::records::validation::RecordDraft;
use crate::records::{ParameterCatalog, RecordId, TestResultService, DEFAULT_TEST_TYPE};

pub(super) type MemoryService = TestResultService<InMemoryStore, InMemoryStore, InMemoryStore>;

pub(super) const PATIENT: &str = "patient-ayse";
pub(super) const SIBLING: &str = "patient-mehmet";
pub(super) const ADMIN: &str = "admin-1";

pub(super) fn profile(id: &str, name: &str, dob: (i32, u32, u32), role: Role) -> SubjectProfile {
    SubjectProfile {
        id: SubjectId(id.to_string()),
        name: name.to_string(),
        email: format!("{id}@example.org"),
        date_of_birth: NaiveDate::from_ymd_opt(dob.0, dob.1, dob.2).expect("valid dob"),
        gender: None,
        role,
    }
}

pub(super) fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new(Arc::new(GuidelineSet::demo()));
    store
        .upsert_profile(profile(PATIENT, "Ayse Demir", (2015, 6, 1), Role::User))
        .expect("seed patient");
    store
        .upsert_profile(profile(SIBLING, "Mehmet Demir", (2019, 2, 10), Role::User))
        .expect("seed sibling");
    store
        .upsert_profile(profile(ADMIN, "Clinic Admin", (1980, 1, 1), Role::Admin))
        .expect("seed admin");
    store
}

pub(super) fn build_service() -> (Arc<MemoryService>, InMemoryStore) {
    let store = seeded_store();
    let shared = Arc::new(store.clone());
    let service = TestResultService::new(
        shared.clone(),
        shared.clone(),
        shared,
        ParameterCatalog::immunoglobulin_panel(),
    );
    (Arc::new(service), store)
}

pub(super) fn draft(subject: &str, date: (i32, u32, u32), values: &[(&str, &str)]) -> RecordDraft {
    RecordDraft {
        subject_id: SubjectId(subject.to_string()),
        observed_at: Utc
            .with_ymd_and_hms(date.0, date.1, date.2, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
        test_type: DEFAULT_TEST_TYPE.to_string(),
        results: values
            .iter()
            .map(|(name, raw)| (name.to_string(), raw.to_string()))
            .collect::<BTreeMap<_, _>>(),
        notes: None,
    }
}

pub(super) fn submit(
    service: &MemoryService,
    subject: &str,
    date: (i32, u32, u32),
    values: &[(&str, &str)],
) -> TestRecord {
    service
        .submit(&Viewer::user(subject), draft(subject, date, values))
        .expect("submission stored")
}

pub(super) fn record_id(record: &TestRecord) -> RecordId {
    record.id.clone().expect("stored record has id")
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Provider whose every call fails, for exercising error mapping.
pub(super) struct UnavailableStore;

impl ProfileProvider for UnavailableStore {
    fn profile(&self, _id: &SubjectId) -> Result<Option<SubjectProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn profiles(&self) -> Result<Vec<SubjectProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}

impl TestRecordProvider for UnavailableStore {
    fn insert(&self, _record: TestRecord) -> Result<TestRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn fetch(&self, _id: &RecordId) -> Result<Option<TestRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn query(&self, _query: &RecordQuery) -> Result<Vec<TestRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}

impl GuidelineProvider for UnavailableStore {
    fn guidelines(&self) -> Result<Arc<GuidelineSet>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}
