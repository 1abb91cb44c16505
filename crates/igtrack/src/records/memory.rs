use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{RecordId, SubjectId, SubjectProfile, TestRecord};
use super::repository::{
    GuidelineProvider, ProfileProvider, RecordQuery, RepositoryError, TestRecordProvider,
};
use crate::guidelines::GuidelineSet;

/// Process-local store backing every provider trait; used by the demo service and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    profiles: Arc<Mutex<HashMap<SubjectId, SubjectProfile>>>,
    records: Arc<Mutex<HashMap<RecordId, TestRecord>>>,
    guidelines: Arc<GuidelineSet>,
    sequence: Arc<AtomicU64>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
}

impl InMemoryStore {
    pub fn new(guidelines: Arc<GuidelineSet>) -> Self {
        Self {
            guidelines,
            ..Self::default()
        }
    }

    pub fn upsert_profile(&self, profile: SubjectProfile) -> Result<(), RepositoryError> {
        lock(&self.profiles)?.insert(profile.id.clone(), profile);
        Ok(())
    }

    fn next_record_id(&self) -> RecordId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        RecordId(format!("rec-{id:06}"))
    }
}

impl ProfileProvider for InMemoryStore {
    fn profile(&self, id: &SubjectId) -> Result<Option<SubjectProfile>, RepositoryError> {
        Ok(lock(&self.profiles)?.get(id).cloned())
    }

    fn profiles(&self) -> Result<Vec<SubjectProfile>, RepositoryError> {
        Ok(lock(&self.profiles)?.values().cloned().collect())
    }
}

impl TestRecordProvider for InMemoryStore {
    fn insert(&self, mut record: TestRecord) -> Result<TestRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let id = match record.id.clone() {
            Some(id) if guard.contains_key(&id) => return Err(RepositoryError::Conflict),
            Some(id) => id,
            None => self.next_record_id(),
        };
        record.id = Some(id.clone());
        guard.insert(id, record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &RecordId) -> Result<Option<TestRecord>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn query(&self, query: &RecordQuery) -> Result<Vec<TestRecord>, RepositoryError> {
        let guard = lock(&self.records)?;
        let mut matches: Vec<TestRecord> = guard
            .values()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        matches.sort_by(|left, right| {
            right
                .observed_at
                .cmp(&left.observed_at)
                .then_with(|| right.id.cmp(&left.id))
        });
        Ok(matches)
    }
}

impl GuidelineProvider for InMemoryStore {
    fn guidelines(&self) -> Result<Arc<GuidelineSet>, RepositoryError> {
        Ok(Arc::clone(&self.guidelines))
    }
}
