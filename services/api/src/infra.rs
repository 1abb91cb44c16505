use chrono::{NaiveDate, TimeZone, Utc};
use igtrack::config::GuidelineSource;
use igtrack::error::AppError;
use igtrack::guidelines::GuidelineSet;
use igtrack::records::{
    InMemoryStore, ParameterCatalog, RecordDraft, Role, ServiceError, SubjectId, SubjectProfile,
    TestRecord, TestResultService, Viewer, DEFAULT_TEST_TYPE,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type MemoryService = TestResultService<InMemoryStore, InMemoryStore, InMemoryStore>;

pub(crate) const DEMO_PATIENT: &str = "demo-patient";
pub(crate) const DEMO_ADMIN: &str = "demo-admin";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn load_guidelines(source: &GuidelineSource) -> Result<Arc<GuidelineSet>, AppError> {
    let set = match source {
        GuidelineSource::BuiltIn => GuidelineSet::demo(),
        GuidelineSource::File(path) => GuidelineSet::load(path)?,
    };

    for (guideline, issues) in set.validate() {
        for (parameter, problems) in issues {
            tracing::warn!(%guideline, %parameter, ?problems, "guideline table has data-quality issues");
        }
    }

    Ok(Arc::new(set))
}

/// Builds the in-memory store and the service that reads from it.
pub(crate) fn memory_service(guidelines: Arc<GuidelineSet>) -> (Arc<MemoryService>, InMemoryStore) {
    let store = InMemoryStore::new(guidelines);
    let shared = Arc::new(store.clone());
    let service = TestResultService::new(
        shared.clone(),
        shared.clone(),
        shared,
        ParameterCatalog::immunoglobulin_panel(),
    );
    (Arc::new(service), store)
}

/// Seeds a patient, an admin, and three panels for the patient.
pub(crate) fn seed_demo_data(
    service: &MemoryService,
    store: &InMemoryStore,
) -> Result<Vec<TestRecord>, ServiceError> {
    store.upsert_profile(SubjectProfile {
        id: SubjectId(DEMO_PATIENT.to_string()),
        name: "Demo Patient".to_string(),
        email: "patient@example.org".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(2015, 6, 1).unwrap_or_default(),
        gender: None,
        role: Role::User,
    })?;
    store.upsert_profile(SubjectProfile {
        id: SubjectId(DEMO_ADMIN.to_string()),
        name: "Clinic Admin".to_string(),
        email: "admin@example.org".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 12).unwrap_or_default(),
        gender: None,
        role: Role::Admin,
    })?;

    let viewer = Viewer::user(DEMO_PATIENT);
    let panels: [((i32, u32, u32), [(&str, &str); 3]); 3] = [
        ((2023, 1, 10), [("IgA", "1.1"), ("IgM", "0.9"), ("IgG", "8.2")]),
        ((2023, 7, 10), [("IgA", "2.4"), ("IgM", "1.1"), ("IgG", "8.2")]),
        ((2024, 1, 1), [("IgA", "3.5"), ("IgM", "1.0"), ("IgG", "9.0")]),
    ];

    let mut stored = Vec::with_capacity(panels.len());
    for ((year, month, day), values) in panels {
        let observed_at = Utc
            .with_ymd_and_hms(year, month, day, 9, 0, 0)
            .single()
            .unwrap_or_default();
        let draft = RecordDraft {
            subject_id: SubjectId(DEMO_PATIENT.to_string()),
            observed_at,
            test_type: DEFAULT_TEST_TYPE.to_string(),
            results: values
                .iter()
                .map(|(name, raw)| (name.to_string(), raw.to_string()))
                .collect::<BTreeMap<_, _>>(),
            notes: None,
        };
        stored.push(service.submit(&viewer, draft)?);
    }

    info!(records = stored.len(), "seeded demo data");
    Ok(stored)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_value_pair(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PARAMETER=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
