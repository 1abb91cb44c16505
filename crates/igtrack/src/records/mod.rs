//! Test record entry, storage boundaries, and the service/HTTP layer built on
//! top of the evaluation engine.

pub mod catalog;
pub mod domain;
pub mod history;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{ParameterCatalog, ParameterSpec, DEFAULT_TEST_TYPE};
pub use domain::{
    Measurement, RecordId, ReferenceRange, Role, SubjectId, SubjectProfile, TestRecord, Viewer,
};
pub use history::{build_history, HistoryEntry, ParameterHistory, RecordHistory};
pub use memory::InMemoryStore;
pub use repository::{
    GuidelineProvider, ProfileProvider, RecordQuery, RecordSummaryView, RepositoryError,
    TestRecordProvider,
};
pub use router::{record_router, ROLE_HEADER, SUBJECT_HEADER};
pub use service::{RosterEntry, ServiceError, TestResultService};
pub use validation::{RecordDraft, ValidationError};
