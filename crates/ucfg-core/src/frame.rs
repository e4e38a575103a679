//! Frame construction and parsing
//!
//! Translates protocol intents into exact byte sequences and back. Every
//! frame layout lives here; the session and transfer layers never touch
//! raw bytes. Responses are expected as delivered by [`Link::read_line`],
//! i.e. including the trailing NEWLINE the device appends.
//!
//! [`Link::read_line`]: crate::link::Link::read_line

use crate::error::{Error, FrameError, Result};
use crate::protocol::*;
use crate::types::ScalarType;

/// Absolute tolerance for float verification.
///
/// Coarse relative to the 1e-4 storage precision, but preserved from the
/// device firmware contract.
pub const FLOAT_TOLERANCE: f64 = 0.5;

/// A value decoded from a read response payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Integral payload
    Int(i64),
    /// Float payload
    Float(f64),
    /// Single-character payload
    Char(char),
}

impl Value {
    /// Numeric view of the value; chars map to their ASCII code.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Int(v) => v as f64,
            Value::Float(v) => v,
            Value::Char(c) => c as u32 as f64,
        }
    }

    /// Compare against the expected value under the type's comparison
    /// rule: exact for integers and chars, [`FLOAT_TOLERANCE`] for floats.
    pub fn matches(&self, expected: f64) -> bool {
        match *self {
            Value::Int(v) => v == expected.trunc() as i64,
            Value::Float(v) => (v - expected).abs() <= FLOAT_TOLERANCE,
            Value::Char(c) => c as u32 as i64 == expected.trunc() as i64,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Char(c) => write!(f, "{}", c),
        }
    }
}

/// Encode a value as its ASCII wire payload.
///
/// Integers become decimal text, chars the single raw character, floats
/// decimal text with the four fractional digits the device can store.
pub fn encode_payload(value: f64, ty: ScalarType) -> String {
    match ty {
        ScalarType::Char => {
            let code = value.trunc() as u32;
            char::from_u32(code).unwrap_or(' ').to_string()
        }
        ScalarType::Float => {
            let mut s = format!("{:.4}", value);
            // Trim insignificant trailing zeros, keep at least one digit
            while s.contains('.') && s.ends_with('0') {
                s.pop();
            }
            if s.ends_with('.') {
                s.pop();
            }
            s
        }
        _ => format!("{}", value.trunc() as i64),
    }
}

// ---- Request frames (PC -> device) ----

/// The enter-config key frame: 4 raw secret bytes.
pub fn enter_config_key() -> [u8; 4] {
    CONFIG_KEY
}

/// The terminate frame, ending config mode.
pub fn terminate() -> [u8; 8] {
    [
        TERMINATE, NULL, TYPE_NONE, LENGTH_ZERO, NOT_USED, NOT_USED, NULL, FRAME_END,
    ]
}

/// A set-memory-address frame. The address travels as ASCII decimal, so
/// the full reportable cursor range (up to [`MAX_ADDRESS`]) fits without
/// narrowing.
pub fn set_address(address: u32) -> Vec<u8> {
    let digits = address.to_string();
    let mut frame = Vec::with_capacity(8 + digits.len());
    frame.extend_from_slice(&[SET_ADDRESS, NULL, TYPE_NONE]);
    frame.push(digits.len() as u8 + LENGTH_OFFSET);
    frame.extend_from_slice(&[NOT_USED, NOT_USED]);
    frame.extend_from_slice(digits.as_bytes());
    frame.extend_from_slice(&[NULL, FRAME_END]);
    frame
}

/// A write-value frame carrying an already-encoded payload.
pub fn write_value(payload: &str, ty: ScalarType) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLong(payload.len()).into());
    }
    if ty == ScalarType::Char && payload.len() != 1 {
        return Err(FrameError::BadCharLength(payload.len()).into());
    }
    let mut frame = Vec::with_capacity(8 + payload.len());
    frame.extend_from_slice(&[WRITE, NULL, ty.wire_code()]);
    frame.push(payload.len() as u8 + LENGTH_OFFSET);
    frame.extend_from_slice(&[NOT_USED, NOT_USED]);
    frame.extend_from_slice(payload.as_bytes());
    frame.extend_from_slice(&[NULL, FRAME_END]);
    Ok(frame)
}

/// A read-value request for the given type.
pub fn read_request(ty: ScalarType) -> [u8; 8] {
    [
        READ,
        NULL,
        ty.wire_code(),
        LENGTH_ZERO,
        NOT_USED,
        NOT_USED,
        NULL,
        FRAME_END,
    ]
}

/// A get-address request.
pub fn get_address() -> [u8; 8] {
    [
        AT_ADDRESS, NULL, TYPE_NONE, LENGTH_ZERO, NOT_USED, NOT_USED, NULL, FRAME_END,
    ]
}

// ---- Response frames (device -> PC; built by the emulator, parsed here) ----

/// A positive acknowledge frame.
pub fn ack_frame() -> [u8; 4] {
    [ACK, NULL, FRAME_END, NEWLINE]
}

/// A negative acknowledge frame.
pub fn nack_frame() -> [u8; 4] {
    [NACK, NULL, FRAME_END, NEWLINE]
}

/// A read-value response carrying an ASCII payload.
pub fn value_response(ty: ScalarType, payload: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(9 + payload.len());
    frame.extend_from_slice(&[READ, NULL, ty.wire_code(), LENGTH_ZERO, NOT_USED, NOT_USED]);
    frame.extend_from_slice(payload.as_bytes());
    frame.extend_from_slice(&[NULL, FRAME_END, NEWLINE]);
    frame
}

/// A get-address response carrying the cursor as ASCII decimal.
pub fn address_response(address: u32) -> Vec<u8> {
    let digits = address.to_string();
    let mut frame = Vec::with_capacity(9 + digits.len());
    frame.extend_from_slice(&[AT_ADDRESS, NULL, TYPE_NONE, LENGTH_ZERO, NOT_USED, NOT_USED]);
    frame.extend_from_slice(digits.as_bytes());
    frame.extend_from_slice(&[NULL, FRAME_END, NEWLINE]);
    frame
}

// ---- Decoding ----

/// Parse an acknowledge frame.
///
/// `Ok(())` for ACK, [`Error::Nack`] for NACK, a frame error for
/// anything else.
pub fn parse_ack(frame: &[u8]) -> Result<()> {
    if frame.len() != ACK_LEN {
        return Err(FrameError::TooShort(frame.len()).into());
    }
    if frame == ack_frame() {
        Ok(())
    } else if frame == nack_frame() {
        Err(Error::Nack)
    } else {
        Err(FrameError::BadHeader.into())
    }
}

/// Validate the common shape of a value/address response and return its
/// payload slice (the bytes between the fixed header and the NULL
/// terminator).
fn check_response(frame: &[u8], header: &[u8]) -> Result<Vec<u8>> {
    if !frame.is_empty() && frame[0] == NACK {
        return Err(Error::Nack);
    }
    if frame.len() < MIN_RESPONSE_LEN {
        return Err(FrameError::TooShort(frame.len()).into());
    }
    if &frame[..header.len()] != header {
        return Err(FrameError::BadHeader.into());
    }
    if frame[4] != NOT_USED || frame[5] != NOT_USED {
        return Err(FrameError::BadReserved.into());
    }
    if frame[frame.len() - 3] != NULL {
        return Err(FrameError::MissingTerminator.into());
    }
    let payload = &frame[6..frame.len() - 3];
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLong(payload.len()).into());
    }
    Ok(payload.to_vec())
}

/// Parse a read-value response into a [`Value`].
///
/// The payload is interpreted per the type code the device declared in
/// the response, not per what was requested.
pub fn parse_value_response(frame: &[u8]) -> Result<Value> {
    let payload = check_response(frame, &[READ, NULL])?;

    let ty = ScalarType::from_wire_code(frame[2])
        .ok_or(FrameError::UnknownTypeCode(frame[2]))?;

    let text = String::from_utf8_lossy(&payload);

    match ty {
        ScalarType::Char => {
            if payload.len() != 1 {
                return Err(FrameError::BadCharLength(payload.len()).into());
            }
            Ok(Value::Char(payload[0] as char))
        }
        ScalarType::Float => {
            let v: f64 = text
                .trim()
                .parse()
                .map_err(|_| FrameError::BadPayload { kind: "float" })?;
            Ok(Value::Float(v))
        }
        _ => {
            if text.contains('.') {
                return Err(FrameError::UnexpectedDecimalPoint.into());
            }
            let v: i64 = text
                .trim()
                .parse()
                .map_err(|_| FrameError::BadPayload { kind: "integer" })?;
            Ok(Value::Int(v))
        }
    }
}

/// Parse a get-address response into the device memory cursor.
pub fn parse_address_response(frame: &[u8]) -> Result<u32> {
    let payload = check_response(
        frame,
        &[AT_ADDRESS, NULL, TYPE_NONE, LENGTH_ZERO, NOT_USED, NOT_USED],
    )?;

    let digits: String = payload
        .iter()
        .map(|&b| b as char)
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return Err(FrameError::BadPayload { kind: "address" }.into());
    }
    let address: u32 = digits
        .parse()
        .map_err(|_| FrameError::BadPayload { kind: "address" })?;
    if address > MAX_ADDRESS {
        return Err(FrameError::AddressOutOfRange(address).into());
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_frame_layout() {
        let frame = write_value("500", ScalarType::Uint16).unwrap();
        assert_eq!(
            frame,
            vec![
                WRITE,
                NULL,
                14, // uint16 type code
                3 + LENGTH_OFFSET,
                NOT_USED,
                NOT_USED,
                b'5',
                b'0',
                b'0',
                NULL,
                FRAME_END
            ]
        );
    }

    #[test]
    fn set_address_frame_layout() {
        let frame = set_address(0);
        assert_eq!(
            frame,
            vec![
                SET_ADDRESS,
                NULL,
                TYPE_NONE,
                1 + LENGTH_OFFSET,
                NOT_USED,
                NOT_USED,
                b'0',
                NULL,
                FRAME_END
            ]
        );
    }

    #[test]
    fn set_address_carries_full_reportable_range() {
        // The largest cursor a device may report must survive re-encoding.
        let frame = set_address(MAX_ADDRESS);
        assert_eq!(&frame[6..11], b"65536");
        assert_eq!(frame[3], 5 + LENGTH_OFFSET);
    }

    #[test]
    fn length_byte_clears_control_space() {
        // All control bytes are < 23; the smallest length byte is 64.
        let frame = write_value("7", ScalarType::Uint8).unwrap();
        assert!(frame[3] >= LENGTH_OFFSET);
    }

    #[test]
    fn payload_too_long_rejected() {
        let long = "9".repeat(MAX_PAYLOAD + 1);
        assert!(write_value(&long, ScalarType::Uint32).is_err());
    }

    #[test]
    fn char_payload_must_be_single() {
        assert!(write_value("ab", ScalarType::Char).is_err());
        assert!(write_value("a", ScalarType::Char).is_ok());
    }

    #[test]
    fn ack_parsing() {
        assert!(parse_ack(&ack_frame()).is_ok());
        assert!(matches!(parse_ack(&nack_frame()), Err(Error::Nack)));
        assert!(parse_ack(&[ACK, NULL, FRAME_END]).is_err());
        assert!(parse_ack(&[0, NULL, FRAME_END, NEWLINE]).is_err());
    }

    #[test]
    fn value_round_trip_int() {
        let frame = value_response(ScalarType::Int16, "-1234");
        assert_eq!(parse_value_response(&frame).unwrap(), Value::Int(-1234));
    }

    #[test]
    fn value_round_trip_every_type_at_extremes() {
        for ty in crate::types::ALL_TYPES {
            for value in [ty.min(), ty.max()] {
                let payload = encode_payload(value, ty);
                let frame = value_response(ty, &payload);
                let decoded = parse_value_response(&frame).unwrap();
                assert!(
                    decoded.matches(value),
                    "{} value {} decoded as {:?}",
                    ty,
                    value,
                    decoded
                );
            }
        }
    }

    #[test]
    fn float_round_trip_within_tolerance() {
        let payload = encode_payload(3.14159, ScalarType::Float);
        let frame = value_response(ScalarType::Float, &payload);
        let decoded = parse_value_response(&frame).unwrap();
        assert!(decoded.matches(3.14159));
        assert!(decoded.matches(3.1)); // within 0.5
        assert!(!decoded.matches(4.0));
    }

    #[test]
    fn char_response_wrong_length_rejected() {
        let frame = value_response(ScalarType::Char, "xy");
        assert!(matches!(
            parse_value_response(&frame),
            Err(Error::Frame(FrameError::BadCharLength(2)))
        ));
    }

    #[test]
    fn decimal_point_in_integer_rejected() {
        let frame = value_response(ScalarType::Uint16, "3.5");
        assert!(matches!(
            parse_value_response(&frame),
            Err(Error::Frame(FrameError::UnexpectedDecimalPoint))
        ));
    }

    #[test]
    fn nack_response_detected_first() {
        assert!(matches!(
            parse_value_response(&nack_frame()),
            Err(Error::Nack)
        ));
    }

    #[test]
    fn truncated_response_rejected() {
        let mut frame = value_response(ScalarType::Uint8, "5");
        frame.truncate(6);
        assert!(matches!(
            parse_value_response(&frame),
            Err(Error::Frame(FrameError::TooShort(6)))
        ));
    }

    #[test]
    fn corrupted_reserved_bytes_rejected() {
        let mut frame = value_response(ScalarType::Uint8, "5");
        frame[4] = 0;
        assert!(matches!(
            parse_value_response(&frame),
            Err(Error::Frame(FrameError::BadReserved))
        ));
    }

    #[test]
    fn missing_null_terminator_rejected() {
        let mut frame = value_response(ScalarType::Uint8, "5");
        let pos = frame.len() - 3;
        frame[pos] = NOT_USED;
        assert!(matches!(
            parse_value_response(&frame),
            Err(Error::Frame(FrameError::MissingTerminator))
        ));
    }

    #[test]
    fn address_round_trip() {
        let frame = address_response(1023);
        assert_eq!(parse_address_response(&frame).unwrap(), 1023);
    }

    #[test]
    fn address_out_of_range_rejected() {
        let frame = address_response(70000);
        assert!(matches!(
            parse_address_response(&frame),
            Err(Error::Frame(FrameError::AddressOutOfRange(70000)))
        ));
    }

    #[test]
    fn address_header_mismatch_rejected() {
        let frame = value_response(ScalarType::Uint8, "5");
        assert!(matches!(
            parse_address_response(&frame),
            Err(Error::Frame(FrameError::BadHeader))
        ));
    }

    #[test]
    fn float_payload_trims_trailing_zeros() {
        assert_eq!(encode_payload(500.0, ScalarType::Float), "500");
        assert_eq!(encode_payload(3.1, ScalarType::Float), "3.1");
        assert_eq!(encode_payload(3.14159, ScalarType::Float), "3.1416");
    }

    #[test]
    fn char_payload_is_raw_character() {
        assert_eq!(encode_payload(65.0, ScalarType::Char), "A");
    }
}
