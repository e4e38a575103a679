//! ucfg-serial - serial port link driver
//!
//! Implements [`Link`] over a real serial device. The device answers
//! every request with a newline-terminated frame, so reads collect bytes
//! until a newline or the configured timeout.

#![warn(missing_docs)]

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use ucfg_core::error::{Error, Result};
use ucfg_core::link::Link;

/// Serial port [`Link`] implementation.
///
/// Construction records the port parameters; the port itself is opened by
/// [`Link::open`] so that the session's connect retry policy applies.
pub struct SerialLink {
    port_name: String,
    baud: u32,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Describe a serial link without opening it.
    pub fn new(port_name: impl Into<String>, baud: u32, timeout: Duration) -> Self {
        Self {
            port_name: port_name.into(),
            baud,
            timeout,
            port: None,
        }
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(Error::NotConnected)
    }
}

impl Link for SerialLink {
    fn open(&mut self) -> Result<()> {
        let port = serialport::new(&self.port_name, self.baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.timeout)
            .open()
            .map_err(|e| Error::Link(e.to_string()))?;

        log::info!(
            "Opened serial port {} at {} baud",
            self.port_name,
            self.baud
        );
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_none() {
            return Err(Error::NotConnected);
        }
        log::info!("Closed serial port {}", self.port_name);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        port.write_all(data)
            .map_err(|e| Error::Link(e.to_string()))?;
        port.flush().map_err(|e| Error::Link(e.to_string()))?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        let timeout = self.timeout;
        let port = self.port_mut()?;

        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match port.read(&mut byte) {
                Ok(0) => return Err(Error::Timeout),
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' {
                        return Ok(line);
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    log::warn!("Port timeout, current timeout = {:?}", timeout);
                    return Err(Error::Timeout);
                }
                Err(e) => return Err(Error::Link(e.to_string())),
            }
        }
    }

    fn flush_input(&mut self) -> Result<()> {
        self.port_mut()?
            .clear(ClearBuffer::Input)
            .map_err(|e| Error::Link(e.to_string()))
    }

    fn flush_output(&mut self) -> Result<()> {
        self.port_mut()?
            .clear(ClearBuffer::Output)
            .map_err(|e| Error::Link(e.to_string()))
    }
}
