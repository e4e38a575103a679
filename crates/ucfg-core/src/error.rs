//! Error types for ucfg-core

use thiserror::Error;

/// Reasons a received frame fails to decode.
///
/// A decode failure means "no valid data" - the transfer layer treats it
/// like a missing response and retries. It is never fatal by itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Frame shorter than the minimum for its kind
    #[error("frame too short ({0} bytes)")]
    TooShort(usize),

    /// Fixed header prefix did not match the expected frame kind
    #[error("unexpected frame header")]
    BadHeader,

    /// A NOT_USED position carried something other than the sentinel
    #[error("reserved bytes corrupted")]
    BadReserved,

    /// Terminating NULL missing at the expected offset
    #[error("frame terminator missing")]
    MissingTerminator,

    /// Payload exceeds the protocol maximum
    #[error("payload too long ({0} bytes)")]
    PayloadTooLong(usize),

    /// Unknown type code in a value response
    #[error("unknown type code 0x{0:02X}")]
    UnknownTypeCode(u8),

    /// Payload text could not be parsed as the declared type
    #[error("cannot parse {kind} from payload")]
    BadPayload {
        /// The type name the payload was declared as
        kind: &'static str,
    },

    /// Decimal point in a payload whose declared type is integral
    #[error("decimal point in non-float payload")]
    UnexpectedDecimalPoint,

    /// A char response must carry exactly one payload byte
    #[error("char payload length {0}, expected 1")]
    BadCharLength(usize),

    /// Reported address outside the device's addressable range
    #[error("address {0} out of range")]
    AddressOutOfRange(u32),
}

/// Errors produced by the protocol engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The link could not be opened, written, or read
    #[error("link error: {0}")]
    Link(String),

    /// No response arrived within the link's read timeout
    #[error("response timeout")]
    Timeout,

    /// The device answered with a NACK frame
    #[error("not acknowledged")]
    Nack,

    /// A response arrived but failed frame-level validation
    #[error("frame decode failed: {0}")]
    Frame(#[from] FrameError),

    /// Operation requires an open link
    #[error("link is not open")]
    NotConnected,

    /// Operation is only valid in config mode
    #[error("not in config mode")]
    NotInConfigMode,

    /// Value outside the range of its scalar type
    #[error("value {value} out of range for {type_name}")]
    ValueOutOfRange {
        /// The offending value
        value: f64,
        /// Name of the scalar type
        type_name: &'static str,
    },

    /// Read-back value disagrees with what was written
    #[error("verification mismatch: wrote {expected}, read {read}")]
    VerifyMismatch {
        /// Value that was written
        expected: f64,
        /// Value that came back
        read: f64,
    },

    /// Retries exhausted for an operation
    #[error("{operation} failed after {attempts} attempts")]
    RetriesExhausted {
        /// What was being attempted
        operation: &'static str,
        /// How many attempts were made
        attempts: u32,
    },
}

/// Result type alias using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
