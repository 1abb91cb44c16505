use std::collections::BTreeMap;

use super::domain::ReferenceRange;

pub const DEFAULT_TEST_TYPE: &str = "Ig Kan Testi";

/// Display unit and static range attached to a parameter at entry time.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub unit: String,
    pub reference_range: Option<ReferenceRange>,
}

/// The set of parameters a record may contain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterCatalog {
    parameters: BTreeMap<String, ParameterSpec>,
}

impl ParameterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        unit: impl Into<String>,
        reference_range: Option<ReferenceRange>,
    ) -> Self {
        self.parameters.insert(
            name.into(),
            ParameterSpec {
                unit: unit.into(),
                reference_range,
            },
        );
        self
    }

    /// IgA, IgM, IgG and the four IgG subclasses.
    pub fn immunoglobulin_panel() -> Self {
        let range = |low, high| Some(ReferenceRange { low, high });
        Self::new()
            .with_parameter("IgA", "mg/dL", range(0.7, 4.0))
            .with_parameter("IgM", "mg/dL", range(0.4, 2.3))
            .with_parameter("IgG", "mg/dL", range(7.0, 16.0))
            .with_parameter("IgG1", "mg/dL", range(3.8, 9.3))
            .with_parameter("IgG2", "mg/dL", range(2.4, 7.0))
            .with_parameter("IgG3", "mg/dL", range(0.22, 1.76))
            .with_parameter("IgG4", "mg/dL", range(0.04, 0.86))
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_lists_all_immunoglobulins() {
        let catalog = ParameterCatalog::immunoglobulin_panel();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(
            names,
            vec!["IgA", "IgG", "IgG1", "IgG2", "IgG3", "IgG4", "IgM"]
        );
        let iga = catalog.get("IgA").expect("IgA present");
        assert_eq!(iga.unit, "mg/dL");
        assert_eq!(
            iga.reference_range,
            Some(ReferenceRange { low: 0.7, high: 4.0 })
        );
    }
}
