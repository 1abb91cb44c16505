use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for patients (and admin accounts).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub String);

/// Identifier wrapper for stored test records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static normal range captured when the record was entered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub low: f64,
    pub high: f64,
}

/// One parameter's reading within a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<ReferenceRange>,
}

/// A completed blood test. Records are never edited after they are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub subject_id: SubjectId,
    pub observed_at: DateTime<Utc>,
    pub test_type: String,
    pub results: BTreeMap<String, Measurement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TestRecord {
    pub fn observed_on(&self) -> NaiveDate {
        self.observed_at.date_naive()
    }

    pub fn value(&self, parameter: &str) -> Option<f64> {
        self.results.get(parameter).map(|measurement| measurement.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Stored account profile. Evaluation only needs `date_of_birth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub id: SubjectId,
    pub name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// Caller identity passed explicitly into every service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub subject_id: SubjectId,
    pub role: Role,
}

impl Viewer {
    pub fn user(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: SubjectId(subject_id.into()),
            role: Role::User,
        }
    }

    pub fn admin(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: SubjectId(subject_id.into()),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins may act on any subject; users only on themselves.
    pub fn can_access(&self, subject_id: &SubjectId) -> bool {
        self.is_admin() || &self.subject_id == subject_id
    }
}
