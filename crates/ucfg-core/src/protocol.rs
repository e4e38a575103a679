//! ucfg protocol constants
//!
//! Every magic byte on the wire is defined here. All control bytes are
//! below 23 so that length bytes, which carry the payload length plus
//! [`LENGTH_OFFSET`], can never collide with them.

/// Shared secret that switches the device into config mode
pub const CONFIG_KEY: [u8; 4] = [2, 4, 6, 8];

/// Terminates every frame
pub const FRAME_END: u8 = 22;
/// Set the device memory cursor
pub const SET_ADDRESS: u8 = 12;
/// Write a value at the cursor
pub const WRITE: u8 = 13;
/// Read the value at the cursor
pub const READ: u8 = 14;
/// Leave config mode
pub const TERMINATE: u8 = 15;
/// Query the current memory cursor
pub const AT_ADDRESS: u8 = 16;
/// Positive acknowledgement
pub const ACK: u8 = 17;
/// Negative acknowledgement
pub const NACK: u8 = 18;
/// Protocol NULL separator
pub const NULL: u8 = 19;
/// Filler for reserved frame positions
pub const NOT_USED: u8 = 20;
/// Length byte meaning "no payload"
pub const LENGTH_ZERO: u8 = 21;
/// ASCII newline, ends every device response
pub const NEWLINE: u8 = 10;

/// Type code for frames that carry no typed payload
pub const TYPE_NONE: u8 = 11;

/// Added to the true payload length on the wire, removed on decode.
///
/// Keeps legitimate length bytes (64..=88) numerically clear of the
/// control-byte space.
pub const LENGTH_OFFSET: u8 = 64;

/// Maximum payload length the device accepts
pub const MAX_PAYLOAD: usize = 24;

/// Exact length of an acknowledge frame
pub const ACK_LEN: usize = 4;

/// Minimum length of a value or address response
pub const MIN_RESPONSE_LEN: usize = 9;

/// Largest address the device will ever report
pub const MAX_ADDRESS: u32 = 65536;
