//! ucfg-dummy - In-memory microcontroller emulator for testing
//!
//! Implements [`Link`] by emulating the device firmware: a byte-addressed
//! EEPROM image, a memory cursor, the config-mode key handshake, and
//! frame parsing that NACKs malformed input. Floats are stored as scaled
//! 32-bit integers with four decimal digits, so read-backs show the same
//! quantization as real hardware. Reads advance the cursor by the type
//! width, writes likewise.
//!
//! Useful for testing and development without real hardware; also powers
//! the `ucfg selftest` command.

#![warn(missing_docs)]

use std::collections::VecDeque;

use ucfg_core::error::{Error, Result};
use ucfg_core::frame;
use ucfg_core::link::Link;
use ucfg_core::protocol::*;
use ucfg_core::types::ScalarType;

/// Scale factor for float storage, matching the firmware's four decimal
/// digits.
const FLOAT_SCALE: f64 = 10000.0;

/// Configuration and fault injection for the emulated device.
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// EEPROM size in bytes
    pub eeprom_size: usize,
    /// NACK every write after this many have succeeded
    pub nack_writes_after: Option<usize>,
    /// Swallow this many responses (the host sees timeouts)
    pub drop_responses: usize,
    /// Corrupt every value response by clobbering a reserved byte
    pub corrupt_reads: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            eeprom_size: 1024,
            nack_writes_after: None,
            drop_responses: 0,
            corrupt_reads: false,
        }
    }
}

/// Emulated microcontroller behind a [`Link`].
pub struct DummyUc {
    config: DummyConfig,
    open: bool,
    in_config: bool,
    cursor: usize,
    memory: Vec<u8>,
    responses: VecDeque<Vec<u8>>,
    writes_done: usize,
}

impl DummyUc {
    /// Create an emulated device with the given configuration.
    pub fn new(config: DummyConfig) -> Self {
        let memory = vec![0xFF; config.eeprom_size];
        Self {
            config,
            open: false,
            in_config: false,
            cursor: 0,
            memory,
            responses: VecDeque::new(),
            writes_done: 0,
        }
    }

    /// Create an emulated device with default configuration.
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// The raw EEPROM image.
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Current memory cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the device believes it is in config mode.
    pub fn in_config(&self) -> bool {
        self.in_config
    }

    /// Queue a response, honoring the fault injection settings.
    fn respond(&mut self, mut frame: Vec<u8>) {
        if self.config.drop_responses > 0 {
            self.config.drop_responses -= 1;
            log::debug!("dummy: dropping response");
            return;
        }
        if self.config.corrupt_reads && frame.len() > 5 && frame[0] == READ {
            frame[4] = 0;
        }
        self.responses.push_back(frame);
    }

    fn ack(&mut self) {
        self.respond(frame::ack_frame().to_vec());
    }

    fn nack(&mut self) {
        self.respond(frame::nack_frame().to_vec());
    }

    /// Dispatch one complete request frame.
    fn handle_frame(&mut self, data: &[u8]) {
        if !self.in_config {
            if data == CONFIG_KEY {
                self.in_config = true;
                self.ack();
            }
            // Anything else outside config mode is normal application
            // traffic; the firmware ignores it.
            return;
        }

        if data == CONFIG_KEY {
            self.ack();
            return;
        }

        match data.first() {
            Some(&TERMINATE) => self.handle_terminate(data),
            Some(&SET_ADDRESS) => self.handle_set_address(data),
            Some(&WRITE) => self.handle_write(data),
            Some(&READ) => self.handle_read(data),
            Some(&AT_ADDRESS) => self.handle_get_address(data),
            _ => self.nack(),
        }
    }

    fn handle_terminate(&mut self, data: &[u8]) {
        if data != frame::terminate() {
            self.nack();
            return;
        }
        self.in_config = false;
        self.ack();
    }

    fn handle_set_address(&mut self, data: &[u8]) {
        // [SET_ADDRESS, NULL, TYPE_NONE, len+64, NOT_USED x2, digits, NULL, FRAME_END]
        if data.len() < 9
            || data[1] != NULL
            || data[2] != TYPE_NONE
            || data[4] != NOT_USED
            || data[5] != NOT_USED
        {
            self.nack();
            return;
        }
        let len = data[3].wrapping_sub(LENGTH_OFFSET) as usize;
        if !(1..=5).contains(&len) || data.len() != 8 + len {
            self.nack();
            return;
        }
        let digits = &data[6..6 + len];
        if !digits.iter().all(u8::is_ascii_digit) {
            self.nack();
            return;
        }
        if data[6 + len] != NULL || data[7 + len] != FRAME_END {
            self.nack();
            return;
        }
        let address: usize = String::from_utf8_lossy(digits).parse().unwrap_or(0);
        if address >= self.config.eeprom_size {
            self.nack();
            return;
        }
        self.cursor = address;
        self.ack();
    }

    fn handle_write(&mut self, data: &[u8]) {
        // [WRITE, NULL, type, len+64, NOT_USED x2, payload, NULL, FRAME_END]
        if data.len() < 9 || data[1] != NULL || data[4] != NOT_USED || data[5] != NOT_USED {
            self.nack();
            return;
        }
        let Some(ty) = ScalarType::from_wire_code(data[2]) else {
            self.nack();
            return;
        };
        let len = data[3].wrapping_sub(LENGTH_OFFSET) as usize;
        if len == 0 || len > MAX_PAYLOAD || data.len() != 8 + len {
            self.nack();
            return;
        }
        if data[6 + len] != NULL || data[7 + len] != FRAME_END {
            self.nack();
            return;
        }

        if let Some(limit) = self.config.nack_writes_after {
            if self.writes_done >= limit {
                log::debug!("dummy: injected write failure");
                self.nack();
                return;
            }
        }

        let payload = &data[6..6 + len];
        if self.store(payload, ty) {
            self.writes_done += 1;
            self.ack();
        } else {
            self.nack();
        }
    }

    fn handle_read(&mut self, data: &[u8]) {
        if data.len() != 8
            || data[1] != NULL
            || data[3] != LENGTH_ZERO
            || data[4] != NOT_USED
            || data[5] != NOT_USED
            || data[6] != NULL
            || data[7] != FRAME_END
        {
            self.nack();
            return;
        }
        let Some(ty) = ScalarType::from_wire_code(data[2]) else {
            self.nack();
            return;
        };
        match self.fetch(ty) {
            Some(payload) => {
                let response = frame::value_response(ty, &payload);
                self.respond(response);
            }
            None => self.nack(),
        }
    }

    fn handle_get_address(&mut self, data: &[u8]) {
        if data != frame::get_address() {
            self.nack();
            return;
        }
        let response = frame::address_response(self.cursor as u32);
        self.respond(response);
    }

    /// Store an ASCII payload at the cursor as its binary representation,
    /// advancing the cursor. Returns false on any parse or bounds error.
    fn store(&mut self, payload: &[u8], ty: ScalarType) -> bool {
        let width = ty.width() as usize;
        if self.cursor + width > self.memory.len() {
            return false;
        }
        let text = String::from_utf8_lossy(payload);

        let stored: u32 = match ty {
            ScalarType::Char => {
                if payload.len() != 1 {
                    return false;
                }
                payload[0] as u32
            }
            ScalarType::Float => {
                let Ok(v) = text.trim().parse::<f64>() else {
                    return false;
                };
                // Truncating cast, as the firmware does.
                ((v * FLOAT_SCALE) as i32) as u32
            }
            _ => {
                let Ok(v) = text.trim().parse::<i64>() else {
                    return false;
                };
                if !ty.in_range(v as f64) {
                    return false;
                }
                v as u32
            }
        };

        let bytes = stored.to_be_bytes();
        self.memory[self.cursor..self.cursor + width].copy_from_slice(&bytes[4 - width..]);
        self.cursor += width;
        true
    }

    /// Fetch the value at the cursor as ASCII text, advancing the cursor.
    fn fetch(&mut self, ty: ScalarType) -> Option<String> {
        let width = ty.width() as usize;
        if self.cursor + width > self.memory.len() {
            return None;
        }
        let mut raw = [0u8; 4];
        raw[4 - width..].copy_from_slice(&self.memory[self.cursor..self.cursor + width]);
        let word = u32::from_be_bytes(raw);
        self.cursor += width;

        Some(match ty {
            ScalarType::Uint8 => (word as u8).to_string(),
            ScalarType::Int8 => (word as u8 as i8).to_string(),
            ScalarType::Uint16 => (word as u16).to_string(),
            ScalarType::Int16 => (word as u16 as i16).to_string(),
            ScalarType::Uint32 => word.to_string(),
            ScalarType::Int32 => (word as i32).to_string(),
            ScalarType::Float => (word as i32 as f64 / FLOAT_SCALE).to_string(),
            ScalarType::Char => ((word as u8) as char).to_string(),
        })
    }
}

impl Link for DummyUc {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(Error::NotConnected);
        }
        self.handle_frame(data);
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        if !self.open {
            return Err(Error::NotConnected);
        }
        self.responses.pop_front().ok_or(Error::Timeout)
    }

    fn flush_input(&mut self) -> Result<()> {
        Ok(())
    }

    fn flush_output(&mut self) -> Result<()> {
        self.responses.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ucfg_core::session::{Session, SessionState};
    use ucfg_core::transfer;
    use ucfg_core::variable::{self, Variable, VariableList};

    fn connected() -> Session<DummyUc> {
        let mut session = Session::new(DummyUc::new_default());
        session.connect(1).unwrap();
        session
    }

    fn delay_list() -> VariableList {
        VariableList::new(vec![Variable::new(
            "DELAY",
            "Millisecond delay between LED toggles",
            ScalarType::Uint16,
            500.0,
            1.0,
            2000.0,
        )
        .unwrap()])
        .unwrap()
    }

    #[test]
    fn enter_then_exit_config_mode() {
        let mut session = connected();
        session.enter_config_mode(1).unwrap();
        assert_eq!(session.state(), SessionState::ConfigMode);
        assert!(session.link_mut().in_config());
        session.exit_config_mode(1).unwrap();
        assert_eq!(session.state(), SessionState::Connected);
        assert!(!session.link_mut().in_config());
    }

    #[test]
    fn get_memory_address_is_idempotent() {
        let mut session = connected();
        session.enter_config_mode(1).unwrap();
        session.set_memory_address(42).unwrap();
        let first = session.get_memory_address().unwrap();
        let second = session.get_memory_address().unwrap();
        let third = session.get_memory_address().unwrap();
        assert_eq!(first, 42);
        assert_eq!(second, 42);
        assert_eq!(third, 42);
    }

    #[test]
    fn read_advances_cursor_by_type_width() {
        let mut session = connected();
        session.enter_config_mode(1).unwrap();
        session.set_memory_address(0).unwrap();
        session.get_data(ScalarType::Uint32).unwrap();
        assert_eq!(session.get_memory_address().unwrap(), 4);
    }

    #[test]
    fn send_list_loopback_reports_all_sent() {
        let list = delay_list();
        let mut session = connected();
        let sent = transfer::send_list(&mut session, &list, true, 3);
        assert_eq!(sent, 1);
        assert_eq!(session.state(), SessionState::Connected);

        let report = transfer::read_list(&mut session, &list, 3).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.entries[0].matched);
        assert_eq!(
            report.entries[0].read,
            Some(ucfg_core::frame::Value::Int(500))
        );
    }

    #[test]
    fn every_type_round_trips_at_extremes() {
        let mut variables = Vec::new();
        for ty in ucfg_core::types::ALL_TYPES {
            for (tag, v) in [("min", ty.min()), ("max", ty.max())] {
                variables.push(
                    Variable::new(
                        format!("{}_{}", ty.name().trim_end_matches("_t"), tag),
                        "extreme",
                        ty,
                        v,
                        ty.min(),
                        ty.max(),
                    )
                    .unwrap(),
                );
            }
        }
        let list = VariableList::new(variables).unwrap();

        let mut session = connected();
        assert_eq!(transfer::send_list(&mut session, &list, true, 3), list.len());

        let report = transfer::read_list(&mut session, &list, 3).unwrap();
        assert!(report.all_matched(), "mismatches: {:?}", report.entries);
    }

    #[test]
    fn float_quantized_to_four_decimals() {
        let list = VariableList::new(vec![Variable::new(
            "PI",
            "float precision check",
            ScalarType::Float,
            3.14159,
            0.0,
            10.0,
        )
        .unwrap()])
        .unwrap();

        let mut session = connected();
        assert_eq!(transfer::send_list(&mut session, &list, true, 3), 1);

        // The device stores (v * 10000) as i32; read-back is within the
        // 0.5 verification tolerance but not bit-exact.
        let report = transfer::read_list(&mut session, &list, 3).unwrap();
        assert!(report.entries[0].matched);
        let read = report.entries[0].read.unwrap().as_f64();
        assert!((read - 3.1415).abs() < 1e-9 || (read - 3.1416).abs() < 1e-9);
    }

    #[test]
    fn injected_write_failure_aborts_with_partial_count() {
        let list = variable::random_list(16);
        let total = list.len();
        assert!(total >= 2, "need at least two variables");

        let mut config = DummyConfig::default();
        config.nack_writes_after = Some(1);
        let mut session = Session::new(DummyUc::new(config));
        session.connect(1).unwrap();

        let sent = transfer::send_list(&mut session, &list, false, 2);
        assert_eq!(sent, 1);
        assert!(sent < total);
        // The abort path still leaves config mode.
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn dropped_responses_retry_then_succeed() {
        let list = delay_list();
        let mut config = DummyConfig::default();
        config.drop_responses = 1; // first response lost, retry wins
        let mut session = Session::new(DummyUc::new(config));
        session.connect(1).unwrap();

        let sent = transfer::send_list(&mut session, &list, true, 3);
        assert_eq!(sent, 1);
    }

    #[test]
    fn corrupt_read_frames_fail_verification() {
        let list = delay_list();
        let mut config = DummyConfig::default();
        config.corrupt_reads = true;
        let mut session = Session::new(DummyUc::new(config));
        session.connect(1).unwrap();

        // Unverified write still succeeds (acks are clean)...
        assert_eq!(transfer::send_list(&mut session, &list, false, 2), 1);
        // ...but every value response is mangled, so the read retries
        // exhaust and the entry reports no value.
        let report = transfer::read_list(&mut session, &list, 2).unwrap();
        assert!(!report.entries[0].matched);
        assert_eq!(report.entries[0].read, None);
    }

    #[test]
    fn cursor_failure_aborts_read_list() {
        let list = delay_list();
        let mut config = DummyConfig::default();
        // Swallow everything: the session never gets past the handshake.
        config.drop_responses = 100;
        let mut session = Session::new(DummyUc::new(config));
        session.connect(1).unwrap();

        assert!(transfer::read_list(&mut session, &list, 2).is_none());
    }

    #[test]
    fn variables_land_at_cumulative_offsets() {
        let list = VariableList::new(vec![
            Variable::new("A", "d", ScalarType::Uint8, 0x11 as f64, 0.0, 255.0).unwrap(),
            Variable::new("B", "d", ScalarType::Uint16, 0x2233 as f64, 0.0, 65535.0).unwrap(),
        ])
        .unwrap();

        let mut session = connected();
        assert_eq!(transfer::send_list(&mut session, &list, false, 1), 2);

        let mem = session.link_mut().memory();
        assert_eq!(mem[0], 0x11); // A at address 0
        assert_eq!(&mem[1..3], &[0x22, 0x33]); // B at address 1
    }

    #[test]
    fn writes_outside_config_mode_are_ignored() {
        let mut dev = DummyUc::new_default();
        dev.open().unwrap();
        dev.write(&ucfg_core::frame::set_address(5)).unwrap();
        assert!(matches!(dev.read_line(), Err(Error::Timeout)));
        assert_eq!(dev.cursor(), 0);
    }
}
