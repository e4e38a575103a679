//! Variable definitions and their EEPROM layout
//!
//! A [`VariableList`] is validated once at load time and treated as
//! immutable for the duration of a transfer session. Ordering is
//! semantically significant: the device address of each variable is the
//! cumulative byte offset of all preceding variables, starting at 0.

pub mod yaml;

use thiserror::Error;

use crate::types::ScalarType;

/// Errors from loading or validating variable definitions.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Definition file could not be read
    #[error("cannot open definition file: {0}")]
    Io(#[from] std::io::Error),

    /// Definition file is not valid YAML of the expected shape
    #[error("cannot parse definition file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// `dataType` names no known scalar type
    #[error("variable {name}: unknown type \"{type_name}\"")]
    UnknownType {
        /// Variable the bad type belongs to
        name: String,
        /// The unrecognized type name
        type_name: String,
    },

    /// A value, min, or max lies outside the type's absolute range
    #[error("variable {name}: {field} {value} out of range for {type_name} ({min}..={max})")]
    OutOfRange {
        /// Variable the bad field belongs to
        name: String,
        /// Which field is out of range
        field: &'static str,
        /// The offending value
        value: f64,
        /// Type name for the message
        type_name: &'static str,
        /// Type minimum
        min: f64,
        /// Type maximum
        max: f64,
    },

    /// `value` violates the variable's own min/max bounds
    #[error("variable {name}: value {value} outside bounds {min}..={max}")]
    OutOfBounds {
        /// Variable with the bad value
        name: String,
        /// The offending value
        value: f64,
        /// Declared minimum
        min: f64,
        /// Declared maximum
        max: f64,
    },

    /// Variable names must be usable as C identifiers
    #[error("variable name \"{0}\" cannot contain whitespace")]
    BadName(String),

    /// Two variables share a name
    #[error("duplicate variable name \"{0}\"")]
    DuplicateName(String),

    /// Combined variable sizes overflow the device address space
    #[error("variables require {total} bytes, exceeding the 65535-byte address space")]
    AddressSpaceExceeded {
        /// Total byte size of the offending list
        total: u32,
    },
}

/// One named, typed, bounded value destined for EEPROM.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    description: String,
    data_type: ScalarType,
    value: f64,
    min: f64,
    max: f64,
}

impl Variable {
    /// Build a variable, enforcing every invariant: the name carries no
    /// whitespace, `value`/`min`/`max` sit inside the type's absolute
    /// range, and `min <= value <= max`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        data_type: ScalarType,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<Self, LoadError> {
        let name = name.into();
        if name.chars().any(char::is_whitespace) {
            return Err(LoadError::BadName(name));
        }
        for (field, v) in [("value", value), ("min", min), ("max", max)] {
            if !data_type.in_range(v) {
                return Err(LoadError::OutOfRange {
                    name,
                    field,
                    value: v,
                    type_name: data_type.name(),
                    min: data_type.min(),
                    max: data_type.max(),
                });
            }
        }
        if value < min || value > max {
            return Err(LoadError::OutOfBounds {
                name,
                value,
                min,
                max,
            });
        }
        Ok(Self {
            name,
            description: description.into(),
            data_type,
            value,
            min,
            max,
        })
    }

    /// Variable name (a valid C identifier fragment).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The scalar type carried on the wire.
    pub fn data_type(&self) -> ScalarType {
        self.data_type
    }

    /// The value to be flashed.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Declared minimum.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Declared maximum.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Storage width in bytes, always derived from the type.
    pub fn size(&self) -> u16 {
        self.data_type.width()
    }
}

/// A validated, ordered list of variables.
#[derive(Debug, Clone, Default)]
pub struct VariableList {
    variables: Vec<Variable>,
}

impl VariableList {
    /// Validate the list: names must be unique and the combined byte
    /// size must fit the device's u16 address space.
    pub fn new(variables: Vec<Variable>) -> Result<Self, LoadError> {
        let total: u32 = variables.iter().map(|v| u32::from(v.size())).sum();
        if total > u32::from(u16::MAX) {
            return Err(LoadError::AddressSpaceExceeded { total });
        }
        for (i, var) in variables.iter().enumerate() {
            if variables[..i].iter().any(|v| v.name == var.name) {
                return Err(LoadError::DuplicateName(var.name.clone()));
            }
        }
        Ok(Self { variables })
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Iterate in device order.
    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }

    /// Device address of the variable at `index`: the sum of the byte
    /// sizes of everything before it.
    pub fn address_of(&self, index: usize) -> u16 {
        self.variables[..index].iter().map(Variable::size).sum()
    }

    /// Total EEPROM bytes the list occupies.
    pub fn total_size(&self) -> u16 {
        self.variables.iter().map(Variable::size).sum()
    }
}

impl<'a> IntoIterator for &'a VariableList {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}

/// Generate a random variable list totalling exactly `byte_length`
/// bytes, used by the self-test harness.
pub fn random_list(byte_length: u16) -> VariableList {
    let mut variables = Vec::new();
    let mut current = 0u16;
    let mut index = 0usize;

    while current < byte_length {
        let ty = crate::types::ALL_TYPES[fastrand::usize(..crate::types::ALL_TYPES.len())];
        if current + ty.width() > byte_length {
            continue;
        }
        current += ty.width();

        let value = random_value(ty);
        let var = Variable::new(
            format!("random_variable_{}", index),
            "A randomly generated variable",
            ty,
            value,
            ty.min(),
            ty.max(),
        )
        .expect("random value within type range");
        variables.push(var);
        index += 1;
    }

    VariableList::new(variables).expect("generated names are unique")
}

fn random_value(ty: ScalarType) -> f64 {
    match ty {
        ScalarType::Float => {
            let (min, max) = (ty.min(), ty.max());
            min + fastrand::f64() * (max - min)
        }
        _ => fastrand::i64(ty.min() as i64..=ty.max() as i64) as f64,
    }
}
