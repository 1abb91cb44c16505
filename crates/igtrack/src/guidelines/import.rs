use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{Guideline, GuidelineSet};
use crate::evaluation::bracket::{AgeBracket, AgeLimit};

#[derive(Debug)]
pub enum GuidelineImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    UnsupportedFormat(String),
}

impl std::fmt::Display for GuidelineImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuidelineImportError::Io(err) => write!(f, "failed to read guideline file: {}", err),
            GuidelineImportError::Csv(err) => write!(f, "invalid guideline CSV data: {}", err),
            GuidelineImportError::Json(err) => write!(f, "invalid guideline JSON data: {}", err),
            GuidelineImportError::UnsupportedFormat(path) => write!(
                f,
                "unsupported guideline file '{}': expected .json or .csv",
                path
            ),
        }
    }
}

impl std::error::Error for GuidelineImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuidelineImportError::Io(err) => Some(err),
            GuidelineImportError::Csv(err) => Some(err),
            GuidelineImportError::Json(err) => Some(err),
            GuidelineImportError::UnsupportedFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for GuidelineImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for GuidelineImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for GuidelineImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

type GuidelineDocument = BTreeMap<String, BTreeMap<String, Vec<AgeBracket>>>;

impl GuidelineSet {
    /// Reads `{ guideline: { parameter: [bracket, ..] } }`. Guidelines come out in name order.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, GuidelineImportError> {
        let document: GuidelineDocument = serde_json::from_reader(reader)?;
        let guidelines = document
            .into_iter()
            .map(|(name, parameters)| Guideline { name, parameters })
            .collect();
        Ok(Self::new(guidelines))
    }

    /// Reads one bracket per row. Guidelines keep first-seen order and rows keep
    /// file order within each parameter.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, GuidelineImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut guidelines: Vec<Guideline> = Vec::new();

        for row in csv_reader.deserialize::<GuidelineRow>() {
            let row = row?;
            let bracket = row.bracket();
            let position = match guidelines.iter().position(|g| g.name == row.guideline) {
                Some(position) => position,
                None => {
                    guidelines.push(Guideline::new(row.guideline.clone()));
                    guidelines.len() - 1
                }
            };
            guidelines[position]
                .parameters
                .entry(row.parameter)
                .or_default()
                .push(bracket);
        }

        Ok(Self::new(guidelines))
    }

    /// Loads a `.json` or `.csv` guideline file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GuidelineImportError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let set = match extension.as_deref() {
            Some("json") => Self::from_json_reader(BufReader::new(File::open(path)?))?,
            Some("csv") => Self::from_csv_reader(BufReader::new(File::open(path)?))?,
            _ => {
                return Err(GuidelineImportError::UnsupportedFormat(
                    path.display().to_string(),
                ))
            }
        };

        debug!(path = %path.display(), guidelines = set.len(), "loaded guideline tables");
        Ok(set)
    }
}

#[derive(Debug, Deserialize)]
struct GuidelineRow {
    guideline: String,
    parameter: String,
    min_age_months: u32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    max_age_months: Option<u32>,
    min_val: f64,
    max_val: f64,
}

impl GuidelineRow {
    fn bracket(&self) -> AgeBracket {
        AgeBracket::new(
            self.min_age_months,
            AgeLimit::from(self.max_age_months),
            self.min_val,
            self.max_val,
        )
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
