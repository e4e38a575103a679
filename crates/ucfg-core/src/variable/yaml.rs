//! YAML variable definition files
//!
//! Parses definition files of the shape:
//!
//! ```yaml
//! - name: DELAY
//!   desc: Millisecond delay between LED toggles
//!   value: 500
//!   dataType: uint16_t
//!   min: 1
//!   max: 2000
//! ```
//!
//! Raw documents are funnelled through the validating [`Variable`] and
//! [`VariableList`] constructors so every invariant holds after loading.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{LoadError, Variable, VariableList};
use crate::types::ScalarType;

/// One entry as it appears in the YAML document.
#[derive(Debug, Deserialize)]
struct RawVariable {
    name: String,
    desc: String,
    value: f64,
    #[serde(rename = "dataType")]
    data_type: String,
    min: f64,
    max: f64,
}

/// Load and validate a definition file.
pub fn load_definitions(path: &Path) -> Result<VariableList, LoadError> {
    log::info!("Loading variable definitions from {}", path.display());
    let text = fs::read_to_string(path)?;
    parse_definitions(&text)
}

/// Parse and validate a definition document.
pub fn parse_definitions(text: &str) -> Result<VariableList, LoadError> {
    let raw: Vec<RawVariable> = serde_yaml::from_str(text)?;

    let mut variables = Vec::with_capacity(raw.len());
    for entry in raw {
        let ty = ScalarType::from_name(&entry.data_type).ok_or_else(|| {
            LoadError::UnknownType {
                name: entry.name.clone(),
                type_name: entry.data_type.clone(),
            }
        })?;
        variables.push(Variable::new(
            entry.name,
            entry.desc,
            ty,
            entry.value,
            entry.min,
            entry.max,
        )?);
    }

    let list = VariableList::new(variables)?;
    log::info!(
        "Loaded {} variables occupying {} bytes",
        list.len(),
        list.total_size()
    );
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "\
- name: DELAY
  desc: Millisecond delay between LED toggles
  value: 500
  dataType: uint16_t
  min: 1
  max: 2000

- name: GAIN
  desc: Loop gain
  value: 3.14159
  dataType: float
  min: -10
  max: 10
";

    #[test]
    fn parses_example_document() {
        let list = parse_definitions(EXAMPLE).unwrap();
        assert_eq!(list.len(), 2);

        let delay = list.iter().next().unwrap();
        assert_eq!(delay.name(), "DELAY");
        assert_eq!(delay.data_type(), ScalarType::Uint16);
        assert_eq!(delay.value(), 500.0);
        assert_eq!(delay.size(), 2);
        assert_eq!(list.total_size(), 6);
    }

    #[test]
    fn unknown_type_rejected() {
        let doc = "- {name: X, desc: d, value: 1, dataType: double, min: 0, max: 2}";
        assert!(matches!(
            parse_definitions(doc),
            Err(LoadError::UnknownType { .. })
        ));
    }

    #[test]
    fn missing_key_rejected() {
        let doc = "- {name: X, value: 1, dataType: uint8_t, min: 0, max: 2}";
        assert!(matches!(parse_definitions(doc), Err(LoadError::Yaml(_))));
    }

    #[test]
    fn duplicate_names_rejected() {
        let doc = "\
- {name: X, desc: d, value: 1, dataType: uint8_t, min: 0, max: 2}
- {name: X, desc: d, value: 2, dataType: uint8_t, min: 0, max: 2}
";
        assert!(matches!(
            parse_definitions(doc),
            Err(LoadError::DuplicateName(_))
        ));
    }

    #[test]
    fn out_of_range_value_rejected() {
        let doc = "- {name: X, desc: d, value: 300, dataType: uint8_t, min: 0, max: 255}";
        assert!(matches!(
            parse_definitions(doc),
            Err(LoadError::OutOfRange { .. })
        ));
    }
}
