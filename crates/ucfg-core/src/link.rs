//! Byte transport contract
//!
//! The protocol engine talks to the device through this trait; concrete
//! implementations live in `ucfg-serial` (real hardware) and `ucfg-dummy`
//! (in-process emulator). The transport is half-duplex request/response:
//! one frame out, one newline-terminated frame back, with a fixed read
//! timeout as the only cancellation mechanism.

use crate::error::Result;

/// Raw byte access to the device.
pub trait Link {
    /// Open the underlying device. Idempotent opens are an error.
    fn open(&mut self) -> Result<()>;

    /// Close the underlying device.
    fn close(&mut self) -> Result<()>;

    /// Whether the device is currently open.
    fn is_open(&self) -> bool;

    /// Write all bytes, blocking until the output buffer drains.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read one newline-terminated response, including the newline.
    ///
    /// Blocks up to the link's fixed read timeout and returns
    /// [`Error::Timeout`] if nothing arrives.
    ///
    /// [`Error::Timeout`]: crate::error::Error::Timeout
    fn read_line(&mut self) -> Result<Vec<u8>>;

    /// Discard any unread input.
    fn flush_input(&mut self) -> Result<()>;

    /// Drain any unsent output.
    fn flush_output(&mut self) -> Result<()>;
}
