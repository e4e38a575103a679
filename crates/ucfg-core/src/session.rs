//! Config-mode session state machine
//!
//! A [`Session`] owns its link exclusively for one
//! connect → operate → disconnect cycle. Address and value operations are
//! only accepted in config mode; invoked out of state they fail
//! immediately without touching the link.

use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::frame::{self, Value};
use crate::link::Link;
use crate::types::ScalarType;

/// Pause between connect attempts.
const CONNECT_BACKOFF: Duration = Duration::from_millis(100);

/// Where the session currently sits in the protocol handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Link closed
    Disconnected,
    /// Link open, device in its normal run mode
    Connected,
    /// Device accepting address and value operations
    ConfigMode,
}

/// One exclusive protocol session over a [`Link`].
pub struct Session<L: Link> {
    link: L,
    state: SessionState,
}

impl<L: Link> Session<L> {
    /// Wrap a (closed) link in a new disconnected session.
    pub fn new(link: L) -> Self {
        Self {
            link,
            state: SessionState::Disconnected,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Access the underlying link.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Open the link, retrying up to `retries` times with a short
    /// backoff.
    pub fn connect(&mut self, retries: u32) -> Result<()> {
        for attempt in 1..=retries.max(1) {
            match self.link.open() {
                Ok(()) => {
                    self.state = SessionState::Connected;
                    return Ok(());
                }
                Err(e) => {
                    log::warn!("Cannot open link, attempt number {}: {}", attempt, e);
                    thread::sleep(CONNECT_BACKOFF);
                }
            }
        }
        Err(Error::RetriesExhausted {
            operation: "connect",
            attempts: retries.max(1),
        })
    }

    /// Close the link. Calling this while not connected is logged and
    /// reported, never fatal to the process.
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.link.is_open() {
            log::warn!("Trying to close a link which is not open");
            return Err(Error::NotConnected);
        }
        self.link.close()?;
        self.state = SessionState::Disconnected;
        Ok(())
    }

    /// Send the shared key and wait for acknowledgement, entering config
    /// mode. Buffers are flushed before every attempt. On exhaustion the
    /// session stays Connected.
    pub fn enter_config_mode(&mut self, retries: u32) -> Result<()> {
        self.require_open()?;

        for attempt in 1..=retries.max(1) {
            self.link.flush_input()?;
            self.link.flush_output()?;
            self.link.write(&frame::enter_config_key())?;

            match self.read_ack() {
                Ok(()) => {
                    log::info!("Entering config mode");
                    self.state = SessionState::ConfigMode;
                    return Ok(());
                }
                Err(e) => {
                    log::warn!(
                        "Failed to enter config mode on attempt number {}: {}",
                        attempt,
                        e
                    );
                }
            }
        }
        Err(Error::RetriesExhausted {
            operation: "enter config mode",
            attempts: retries.max(1),
        })
    }

    /// Send the terminate frame and wait for acknowledgement, returning
    /// the device to its normal run mode.
    pub fn exit_config_mode(&mut self, retries: u32) -> Result<()> {
        self.require_open()?;

        for attempt in 1..=retries.max(1) {
            self.link.flush_input()?;
            self.link.flush_output()?;
            self.link.write(&frame::terminate())?;

            match self.read_ack() {
                Ok(()) => {
                    log::info!("Exiting config mode");
                    self.state = SessionState::Connected;
                    return Ok(());
                }
                Err(e) => {
                    log::warn!(
                        "Failed to exit config mode on attempt number {}: {}",
                        attempt,
                        e
                    );
                }
            }
        }
        Err(Error::RetriesExhausted {
            operation: "exit config mode",
            attempts: retries.max(1),
        })
    }

    /// Point the device memory cursor at `address`. Takes the full
    /// range [`get_memory_address`] can report, so a restored cursor is
    /// never narrowed.
    ///
    /// [`get_memory_address`]: Session::get_memory_address
    pub fn set_memory_address(&mut self, address: u32) -> Result<()> {
        self.require_config()?;
        log::debug!("Setting memory address to {}", address);
        self.link.write(&frame::set_address(address))?;
        self.read_ack()
    }

    /// Ask the device where its memory cursor currently points.
    pub fn get_memory_address(&mut self) -> Result<u32> {
        self.require_config()?;
        let response = self.exchange(&frame::get_address())?;
        let address = frame::parse_address_response(&response)?;
        log::debug!("Current device memory address: {}", address);
        Ok(address)
    }

    /// Write `value` at the cursor. The cursor advances by the type's
    /// width on success.
    pub fn set_data(&mut self, value: f64, ty: ScalarType) -> Result<()> {
        self.require_config()?;
        ty.check_range(value)?;
        let payload = frame::encode_payload(value, ty);
        log::debug!("Writing {} of type {} at current address", payload, ty);
        let bytes = frame::write_value(&payload, ty)?;
        self.link.write(&bytes)?;
        self.read_ack()
    }

    /// Read the value at the cursor as `ty`. The cursor advances by the
    /// type's width as a side effect, even on a mismatch upstream.
    pub fn get_data(&mut self, ty: ScalarType) -> Result<Value> {
        self.require_config()?;
        let response = self.exchange(&frame::read_request(ty))?;
        let value = frame::parse_value_response(&response)?;
        log::debug!("Read {:?} of type {} at current address", value, ty);
        Ok(value)
    }

    fn require_open(&self) -> Result<()> {
        if self.link.is_open() {
            Ok(())
        } else {
            log::warn!("Operation attempted while link is not open");
            Err(Error::NotConnected)
        }
    }

    fn require_config(&self) -> Result<()> {
        self.require_open()?;
        if self.state == SessionState::ConfigMode {
            Ok(())
        } else {
            log::warn!("Operation attempted while not in config mode");
            Err(Error::NotInConfigMode)
        }
    }

    fn exchange(&mut self, request: &[u8]) -> Result<Vec<u8>> {
        self.link.write(request)?;
        self.link.read_line()
    }

    fn read_ack(&mut self) -> Result<()> {
        let response = self.link.read_line()?;
        frame::parse_ack(&response)
    }
}
