//! ucfg-core - Protocol engine for microcontroller EEPROM configuration
//!
//! This crate implements the ucfg serial protocol used to write persistent
//! variables into a microcontroller's EEPROM and read them back for
//! verification.
//!
//! # Architecture
//!
//! - [`types`] - the fixed catalogue of scalar types the protocol carries
//! - [`variable`] - validated variable definitions and their EEPROM layout
//! - [`protocol`] - every wire constant in one place
//! - [`frame`] - frame construction and parsing
//! - [`link`] - the byte transport contract ([`link::Link`])
//! - [`session`] - the connect/config-mode state machine
//! - [`transfer`] - per-variable and bulk write/read/verify operations
//!
//! # Example
//!
//! ```ignore
//! use ucfg_core::{session::Session, transfer};
//!
//! let link = ucfg_serial::SerialLink::new("/dev/ttyUSB0", 115200, timeout);
//! let mut session = Session::new(link);
//! session.connect(3)?;
//! let sent = transfer::send_list(&mut session, &variables, true, 3);
//! session.disconnect()?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod frame;
pub mod link;
pub mod protocol;
pub mod session;
pub mod transfer;
pub mod types;
pub mod variable;

pub use error::{Error, Result};
pub use link::Link;
pub use session::{Session, SessionState};
pub use transfer::{ReadOutcome, TransferReport};
pub use types::ScalarType;
pub use variable::{Variable, VariableList};
