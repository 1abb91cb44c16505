use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{RecordId, TestRecord};
use crate::evaluation::{compare_to_previous, TrendDirection};

/// One past reading of a parameter and its direction against the reading before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub record_id: Option<RecordId>,
    pub observed_at: DateTime<Utc>,
    pub value: f64,
    pub unit: String,
    pub trend: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterHistory {
    pub parameter: String,
    /// Newest first; the first entry is the anchor record's own reading.
    pub entries: Vec<HistoryEntry>,
}

impl ParameterHistory {
    pub fn latest_trend(&self) -> TrendDirection {
        self.entries
            .first()
            .map(|entry| entry.trend)
            .unwrap_or(TrendDirection::NoHistory)
    }
}

/// Previous values for every parameter of an anchor record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordHistory {
    pub record_id: Option<RecordId>,
    pub test_type: String,
    pub observed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub parameters: Vec<ParameterHistory>,
}

impl RecordHistory {
    pub fn parameter(&self, name: &str) -> Option<&ParameterHistory> {
        self.parameters.iter().find(|entry| entry.parameter == name)
    }
}

/// Builds per-parameter history from `related`, which must be newest first and
/// should include the anchor itself. Records listed ahead of the anchor are
/// dropped, so the anchor's reading always comes first. Records lacking a
/// parameter are skipped for that parameter; each entry is compared only with
/// entries observed strictly earlier.
pub fn build_history(anchor: &TestRecord, related: &[TestRecord]) -> RecordHistory {
    let start = related
        .iter()
        .position(|record| record.id == anchor.id)
        .unwrap_or(0);
    let related = &related[start..];

    let parameters = anchor
        .results
        .keys()
        .map(|parameter| {
            let readings: Vec<(&TestRecord, f64, &str)> = related
                .iter()
                .filter_map(|record| {
                    record
                        .results
                        .get(parameter)
                        .map(|measurement| (record, measurement.value, measurement.unit.as_str()))
                })
                .collect();
            let values: Vec<f64> = readings.iter().map(|(_, value, _)| *value).collect();

            let entries = readings
                .iter()
                .enumerate()
                .map(|(index, (record, value, unit))| {
                    let older = readings[index + 1..]
                        .iter()
                        .position(|(prior, _, _)| prior.observed_at < record.observed_at)
                        .map_or(values.len(), |offset| index + 1 + offset);
                    HistoryEntry {
                        record_id: record.id.clone(),
                        observed_at: record.observed_at,
                        value: *value,
                        unit: unit.to_string(),
                        trend: compare_to_previous(*value, &values[older..]),
                    }
                })
                .collect();

            ParameterHistory {
                parameter: parameter.clone(),
                entries,
            }
        })
        .collect();

    RecordHistory {
        record_id: anchor.id.clone(),
        test_type: anchor.test_type.clone(),
        observed_at: anchor.observed_at,
        notes: anchor.notes.clone(),
        parameters,
    }
}
