//! Scalar type registry
//!
//! The protocol carries eight scalar types. Each has a wire type code
//! (distinct from the frame opcode space), a byte width in EEPROM, and an
//! inclusive numeric range. The float range reflects storage as a scaled
//! 32-bit integer with four decimal digits of precision.

use crate::error::{Error, Result};

/// A scalar type the protocol can transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Unsigned 8-bit integer
    Uint8,
    /// Signed 8-bit integer
    Int8,
    /// Unsigned 16-bit integer
    Uint16,
    /// Signed 16-bit integer
    Int16,
    /// Unsigned 32-bit integer
    Uint32,
    /// Signed 32-bit integer
    Int32,
    /// Floating point, four decimal digits of storage precision
    Float,
    /// Printable ASCII character (32..=127)
    Char,
}

/// All scalar types in wire-code order.
pub const ALL_TYPES: [ScalarType; 8] = [
    ScalarType::Uint8,
    ScalarType::Int8,
    ScalarType::Uint16,
    ScalarType::Int16,
    ScalarType::Uint32,
    ScalarType::Int32,
    ScalarType::Float,
    ScalarType::Char,
];

impl ScalarType {
    /// Resolve a type from its textual name (the C spelling used in
    /// variable definition files).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "uint8_t" => Some(Self::Uint8),
            "int8_t" => Some(Self::Int8),
            "uint16_t" => Some(Self::Uint16),
            "int16_t" => Some(Self::Int16),
            "uint32_t" => Some(Self::Uint32),
            "int32_t" => Some(Self::Int32),
            "float" => Some(Self::Float),
            "char" => Some(Self::Char),
            _ => None,
        }
    }

    /// Resolve a type from its single-byte wire code.
    pub fn from_wire_code(code: u8) -> Option<Self> {
        match code {
            12 => Some(Self::Uint8),
            13 => Some(Self::Int8),
            14 => Some(Self::Uint16),
            15 => Some(Self::Int16),
            16 => Some(Self::Uint32),
            17 => Some(Self::Int32),
            18 => Some(Self::Float),
            19 => Some(Self::Char),
            _ => None,
        }
    }

    /// The textual name used in definition files and generated headers.
    pub fn name(self) -> &'static str {
        match self {
            Self::Uint8 => "uint8_t",
            Self::Int8 => "int8_t",
            Self::Uint16 => "uint16_t",
            Self::Int16 => "int16_t",
            Self::Uint32 => "uint32_t",
            Self::Int32 => "int32_t",
            Self::Float => "float",
            Self::Char => "char",
        }
    }

    /// The single-byte wire type code.
    pub fn wire_code(self) -> u8 {
        match self {
            Self::Uint8 => 12,
            Self::Int8 => 13,
            Self::Uint16 => 14,
            Self::Int16 => 15,
            Self::Uint32 => 16,
            Self::Int32 => 17,
            Self::Float => 18,
            Self::Char => 19,
        }
    }

    /// Storage width in EEPROM, in bytes.
    pub fn width(self) -> u16 {
        match self {
            Self::Uint8 | Self::Int8 | Self::Char => 1,
            Self::Uint16 | Self::Int16 => 2,
            Self::Uint32 | Self::Int32 | Self::Float => 4,
        }
    }

    /// Inclusive minimum of the type's range.
    pub fn min(self) -> f64 {
        match self {
            Self::Uint8 | Self::Uint16 | Self::Uint32 => 0.0,
            Self::Int8 => -127.0,
            Self::Int16 => -(2f64.powi(15) - 1.0),
            Self::Int32 => -(2f64.powi(31) - 1.0),
            Self::Float => -(2f64.powi(31) - 1.0) / 10000.0,
            Self::Char => 32.0,
        }
    }

    /// Inclusive maximum of the type's range.
    pub fn max(self) -> f64 {
        match self {
            Self::Uint8 => 255.0,
            Self::Int8 => 127.0,
            Self::Uint16 => 2f64.powi(16) - 1.0,
            Self::Int16 => 2f64.powi(15) - 1.0,
            Self::Uint32 => 2f64.powi(32) - 1.0,
            Self::Int32 => 2f64.powi(31) - 1.0,
            Self::Float => (2f64.powi(31) - 1.0) / 10000.0,
            Self::Char => 127.0,
        }
    }

    /// Whether `value` lies within the type's absolute range.
    pub fn in_range(self, value: f64) -> bool {
        value >= self.min() && value <= self.max()
    }

    /// Range-check `value`, returning it on success.
    pub fn check_range(self, value: f64) -> Result<f64> {
        if self.in_range(value) {
            Ok(value)
        } else {
            Err(Error::ValueOutOfRange {
                value,
                type_name: self.name(),
            })
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
