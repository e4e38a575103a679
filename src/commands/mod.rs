//! Command implementations

pub mod flash;
pub mod gen;
pub mod query;
pub mod read;
pub mod selftest;

use std::time::Duration;

use ucfg_core::session::Session;
use ucfg_serial::SerialLink;

use crate::config::AppConfig;

/// Open a connected session on the configured serial port.
pub fn open_session(config: &AppConfig) -> Result<Session<SerialLink>, Box<dyn std::error::Error>> {
    let link = SerialLink::new(
        &config.serial_port,
        config.baud,
        Duration::from_millis(config.read_timeout_ms),
    );
    let mut session = Session::new(link);
    session.connect(config.retries).map_err(|e| {
        format!(
            "Error connecting to device on port {}: {}",
            config.serial_port, e
        )
    })?;
    Ok(session)
}
