//! Per-variable and bulk transfer operations
//!
//! The policy layer on top of the session: write-then-verify for single
//! values, ordered bulk send/read across a variable list, and the retry
//! rules for each sub-step.
//!
//! A device read advances the remote memory cursor as a side effect, so
//! verification always records the cursor first and restores it before
//! re-reading; skipping the restore would silently verify the wrong
//! location on retry.

use crate::error::{Error, Result};
use crate::frame::Value;
use crate::link::Link;
use crate::session::Session;
use crate::types::ScalarType;
use crate::variable::{Variable, VariableList};

/// Result of reading one variable back.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    /// The last value the device returned, if any read succeeded
    pub value: Option<Value>,
    /// Whether that value matched the expectation under the type's rule
    pub matched: bool,
}

/// One row of a bulk read report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadEntry {
    /// Variable name
    pub name: String,
    /// Value we expected the device to hold
    pub expected: f64,
    /// Value the device reported, if any
    pub read: Option<Value>,
    /// Whether expected and read agree
    pub matched: bool,
}

/// Report for one bulk read, created fresh per call.
#[derive(Debug, Clone, Default)]
pub struct TransferReport {
    /// Per-variable outcomes in list order
    pub entries: Vec<ReadEntry>,
}

impl TransferReport {
    /// Number of variables read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the report is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many entries matched their expectation.
    pub fn matched_count(&self) -> usize {
        self.entries.iter().filter(|e| e.matched).count()
    }

    /// Whether every entry matched.
    pub fn all_matched(&self) -> bool {
        self.matched_count() == self.len()
    }
}

/// Fetch the remote cursor, retrying up to `retries` times.
fn acquire_address<L: Link>(session: &mut Session<L>, retries: u32) -> Result<u32> {
    let retries = retries.max(1);
    for attempt in 1..=retries {
        match session.get_memory_address() {
            Ok(addr) => return Ok(addr),
            Err(e) => {
                log::warn!(
                    "Attempting to get memory address again, attempt {}: {}",
                    attempt,
                    e
                );
            }
        }
    }
    Err(Error::RetriesExhausted {
        operation: "get memory address",
        attempts: retries,
    })
}

/// Write one value at the current cursor, optionally verifying it by
/// read-back.
///
/// When verifying, the cursor is recorded before the write and restored
/// before each read-back attempt. Every sub-step retries independently.
pub fn write_one<L: Link>(
    session: &mut Session<L>,
    value: f64,
    ty: ScalarType,
    verify: bool,
    retries: u32,
) -> Result<()> {
    let retries = retries.max(1);

    // The address being written, needed to point the cursor back for
    // verification.
    let original_address = if verify {
        Some(acquire_address(session, retries)?)
    } else {
        None
    };

    let mut written = false;
    for attempt in 1..=retries {
        match session.set_data(value, ty) {
            Ok(()) => {
                written = true;
                break;
            }
            Err(e) => log::warn!("Failed setting data on attempt number {}: {}", attempt, e),
        }
    }
    if !written {
        return Err(Error::RetriesExhausted {
            operation: "set data",
            attempts: retries,
        });
    }

    let Some(original_address) = original_address else {
        return Ok(());
    };

    let mut restored = false;
    for attempt in 1..=retries {
        match session.set_memory_address(original_address) {
            Ok(()) => {
                restored = true;
                break;
            }
            Err(e) => log::warn!(
                "Failed setting the original address for verification on attempt number {}: {}",
                attempt,
                e
            ),
        }
    }
    if !restored {
        return Err(Error::RetriesExhausted {
            operation: "restore memory address",
            attempts: retries,
        });
    }

    let mut last_read = None;
    for attempt in 1..=retries {
        match session.get_data(ty) {
            Err(e) => {
                log::warn!(
                    "Failed reading data back for verification on attempt number {}: {}",
                    attempt,
                    e
                );
                continue;
            }
            Ok(read) => {
                if read.matches(value) {
                    return Ok(());
                }
                log::warn!(
                    "Received incorrect data for verification on attempt number {}",
                    attempt
                );
                last_read = Some(read);
            }
        }
        // The failed read advanced the cursor; point it back before the
        // next attempt.
        if let Err(e) = session.set_memory_address(original_address) {
            log::warn!(
                "Failed setting the original address for repeat verification: {}",
                e
            );
        }
    }

    match last_read {
        Some(read) => Err(Error::VerifyMismatch {
            expected: value,
            read: read.as_f64(),
        }),
        None => Err(Error::RetriesExhausted {
            operation: "verify data",
            attempts: retries,
        }),
    }
}

/// Read one value at the current cursor and compare it against
/// `expected`.
///
/// Cursor acquisition failure is fatal for the call; a persistent
/// mismatch is not - the last value comes back with `matched = false`.
pub fn read_one<L: Link>(
    session: &mut Session<L>,
    expected: f64,
    ty: ScalarType,
    retries: u32,
) -> Result<ReadOutcome> {
    let retries = retries.max(1);
    let original_address = acquire_address(session, retries)?;

    let mut last_read = None;
    for attempt in 1..=retries {
        match session.get_data(ty) {
            Err(e) => {
                log::warn!(
                    "Failed reading data on attempt number {}: {}",
                    attempt,
                    e
                );
                continue;
            }
            Ok(read) => {
                if read.matches(expected) {
                    return Ok(ReadOutcome {
                        value: Some(read),
                        matched: true,
                    });
                }
                log::warn!(
                    "Received incorrect data on attempt number {}",
                    attempt
                );
                last_read = Some(read);
            }
        }
        // A read advances the cursor; reset it so the retry checks the
        // same location.
        if let Err(e) = session.set_memory_address(original_address) {
            log::warn!("Failed resetting address for repeat read: {}", e);
        }
    }

    Ok(ReadOutcome {
        value: last_read,
        matched: false,
    })
}

/// Write every variable in list order, with verification, returning the
/// count successfully written.
///
/// The batch aborts on the first variable that fails after exhausting
/// its retries; a partial count signals where the failure occurred.
/// Config mode is always exited on the way out.
pub fn send_list<L: Link>(
    session: &mut Session<L>,
    list: &VariableList,
    verify: bool,
    retries: u32,
) -> usize {
    send_list_with(session, list, verify, retries, |_| {})
}

/// [`send_list`] with a per-variable progress callback, invoked after
/// each successful write.
pub fn send_list_with<L: Link>(
    session: &mut Session<L>,
    list: &VariableList,
    verify: bool,
    retries: u32,
    mut progress: impl FnMut(&Variable),
) -> usize {
    if let Err(e) = session.enter_config_mode(retries) {
        log::warn!("Failed to enter config mode: {}", e);
        let _ = session.exit_config_mode(retries);
        return 0;
    }

    if let Err(e) = session.set_memory_address(0) {
        log::warn!("Failed to set memory address: {}", e);
        let _ = session.exit_config_mode(retries);
        return 0;
    }

    let mut sent = 0;
    for var in list {
        match write_one(session, var.value(), var.data_type(), verify, retries) {
            Ok(()) => {
                sent += 1;
                progress(var);
            }
            Err(e) => {
                log::warn!(
                    "Failed sending \"{}\" of value {} and type {}: {}",
                    var.name(),
                    var.value(),
                    var.data_type(),
                    e
                );
                let _ = session.exit_config_mode(retries);
                return sent;
            }
        }
    }

    let _ = session.exit_config_mode(retries);
    sent
}

/// Read every variable in list order and report each against its
/// expected value.
///
/// Returns `None` only when cursor acquisition (or session entry)
/// fails; individual mismatches still yield a complete report.
pub fn read_list<L: Link>(
    session: &mut Session<L>,
    list: &VariableList,
    retries: u32,
) -> Option<TransferReport> {
    if let Err(e) = session.enter_config_mode(retries) {
        log::warn!("Failed to enter config mode: {}", e);
        let _ = session.exit_config_mode(retries);
        return None;
    }

    if let Err(e) = session.set_memory_address(0) {
        log::warn!("Failed to set memory address: {}", e);
        let _ = session.exit_config_mode(retries);
        return None;
    }

    let mut report = TransferReport::default();
    for var in list {
        match read_one(session, var.value(), var.data_type(), retries) {
            Ok(outcome) => report.entries.push(ReadEntry {
                name: var.name().to_string(),
                expected: var.value(),
                read: outcome.value,
                matched: outcome.matched,
            }),
            Err(e) => {
                log::warn!("Aborting read of \"{}\": {}", var.name(), e);
                let _ = session.exit_config_mode(retries);
                return None;
            }
        }
    }

    let _ = session.exit_config_mode(retries);
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as CoreResult;
    use crate::frame;
    use std::collections::VecDeque;

    struct ScriptedLink {
        open: bool,
        responses: VecDeque<Vec<u8>>,
        written: Vec<Vec<u8>>,
    }

    impl ScriptedLink {
        fn new(responses: Vec<Vec<u8>>) -> Self {
            Self {
                open: false,
                responses: responses.into(),
                written: Vec::new(),
            }
        }
    }

    impl Link for ScriptedLink {
        fn open(&mut self) -> CoreResult<()> {
            self.open = true;
            Ok(())
        }
        fn close(&mut self) -> CoreResult<()> {
            self.open = false;
            Ok(())
        }
        fn is_open(&self) -> bool {
            self.open
        }
        fn write(&mut self, data: &[u8]) -> CoreResult<()> {
            self.written.push(data.to_vec());
            Ok(())
        }
        fn read_line(&mut self) -> CoreResult<Vec<u8>> {
            self.responses.pop_front().ok_or(Error::Timeout)
        }
        fn flush_input(&mut self) -> CoreResult<()> {
            Ok(())
        }
        fn flush_output(&mut self) -> CoreResult<()> {
            Ok(())
        }
    }

    fn config_session(responses: Vec<Vec<u8>>) -> Session<ScriptedLink> {
        // Prefix the script with the enter-config ack.
        let mut all = vec![frame::ack_frame().to_vec()];
        all.extend(responses);
        let mut session = Session::new(ScriptedLink::new(all));
        session.connect(1).unwrap();
        session.enter_config_mode(1).unwrap();
        session
    }

    #[test]
    fn write_one_verified_happy_path() {
        let mut session = config_session(vec![
            frame::address_response(10),                       // record cursor
            frame::ack_frame().to_vec(),                       // write ack
            frame::ack_frame().to_vec(),                       // restore cursor ack
            frame::value_response(ScalarType::Uint16, "500"),  // read-back
        ]);
        write_one(&mut session, 500.0, ScalarType::Uint16, true, 1).unwrap();
    }

    #[test]
    fn write_one_unverified_skips_cursor_dance() {
        let mut session = config_session(vec![frame::ack_frame().to_vec()]);
        write_one(&mut session, 7.0, ScalarType::Uint8, false, 1).unwrap();
    }

    #[test]
    fn write_one_mismatch_resolves_to_failure() {
        let mut session = config_session(vec![
            frame::address_response(0),
            frame::ack_frame().to_vec(),
            frame::ack_frame().to_vec(),
            frame::value_response(ScalarType::Uint16, "499"), // wrong readback
            frame::ack_frame().to_vec(),                      // cursor reset
        ]);
        let err = write_one(&mut session, 500.0, ScalarType::Uint16, true, 1).unwrap_err();
        assert!(matches!(err, Error::VerifyMismatch { .. }));
    }

    #[test]
    fn verify_restores_cursor_at_largest_reportable_address() {
        // A cursor of 65536 is within what the device may report; the
        // restore frame must carry it back in full, not narrowed to 0.
        let mut session = config_session(vec![
            frame::address_response(65536),
            frame::ack_frame().to_vec(),
            frame::ack_frame().to_vec(),
            frame::value_response(ScalarType::Uint8, "7"),
        ]);
        write_one(&mut session, 7.0, ScalarType::Uint8, true, 1).unwrap();

        let written = &session.link_mut().written;
        assert!(
            written.contains(&frame::set_address(65536)),
            "cursor restored to wrong address"
        );
        assert!(!written.contains(&frame::set_address(0)));
    }

    #[test]
    fn write_one_retries_read_and_resets_cursor() {
        let mut session = config_session(vec![
            frame::address_response(4),
            frame::ack_frame().to_vec(),
            frame::ack_frame().to_vec(),
            frame::value_response(ScalarType::Int8, "-5"),  // wrong
            frame::ack_frame().to_vec(),                    // cursor reset ack
            frame::value_response(ScalarType::Int8, "42"),  // right on retry
        ]);
        write_one(&mut session, 42.0, ScalarType::Int8, true, 2).unwrap();
    }

    #[test]
    fn read_one_mismatch_is_not_fatal() {
        let mut session = config_session(vec![
            frame::address_response(0),
            frame::value_response(ScalarType::Uint8, "9"),
            frame::ack_frame().to_vec(), // cursor reset after mismatch
        ]);
        let outcome = read_one(&mut session, 8.0, ScalarType::Uint8, 1).unwrap();
        assert!(!outcome.matched);
        assert_eq!(outcome.value, Some(Value::Int(9)));
    }

    #[test]
    fn read_one_cursor_failure_is_fatal() {
        // No responses at all: address acquisition times out.
        let mut session = config_session(vec![]);
        let err = read_one(&mut session, 8.0, ScalarType::Uint8, 2).unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted { .. }));
    }

    #[test]
    fn float_tolerance_applied() {
        let mut session = config_session(vec![
            frame::address_response(0),
            frame::value_response(ScalarType::Float, "3.1"),
        ]);
        let outcome = read_one(&mut session, 3.14159, ScalarType::Float, 1).unwrap();
        assert!(outcome.matched);
    }
}
