//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Baud rates the device firmware is known to run at.
pub const SUPPORTED_BAUDS: [u32; 5] = [9600, 19200, 38400, 57600, 115200];

/// Parse and validate a baud rate argument
fn parse_baud(s: &str) -> Result<u32, String> {
    let baud: u32 = s.parse().map_err(|e| format!("Invalid baud rate: {}", e))?;
    if SUPPORTED_BAUDS.contains(&baud) {
        Ok(baud)
    } else {
        Err(format!(
            "Unsupported baud rate {} [supported: {}]",
            baud,
            SUPPORTED_BAUDS.map(|b| b.to_string()).join(", ")
        ))
    }
}

#[derive(Parser)]
#[command(name = "ucfg")]
#[command(author, version, about = "Microcontroller EEPROM variable configurator", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the app configuration file
    /// Defaults to ./config.yml, generated with defaults if missing
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Serial port the microcontroller is connected to (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<String>,

    /// Serial baud rate (overrides config)
    #[arg(short, long, global = true, value_parser = parse_baud)]
    pub baud: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send variables to the microcontroller, verifying each one
    Flash {
        /// Variable definition file (YAML)
        #[arg(short, long)]
        input: PathBuf,

        /// Also generate a C header file with the EEPROM offsets
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip read-back verification of each write
        #[arg(long)]
        no_verify: bool,
    },

    /// Read variables back and compare against a definition file
    Read {
        /// Variable definition file (YAML)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show the contents of a definition file without touching the device
    Query {
        /// Variable definition file (YAML)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Generate a C header file mapping variable names to EEPROM offsets
    GenHeader {
        /// Variable definition file (YAML)
        #[arg(short, long)]
        input: PathBuf,

        /// Output header file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate a commented example variable definition file
    GenExample {
        /// Output file
        #[arg(short, long, default_value = "variables.yml")]
        output: PathBuf,
    },

    /// Generate an app configuration file with default parameters
    GenConfig {
        /// Output file
        #[arg(short, long, default_value = "config.yml")]
        output: PathBuf,
    },

    /// Exercise the full protocol stack against an in-process device
    Selftest {
        /// Byte size of the random variable list
        #[arg(long)]
        size: Option<u16>,
    },
}
