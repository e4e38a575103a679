//! ucfg - Microcontroller EEPROM variable configurator
//!
//! Flashes typed configuration variables into a microcontroller's EEPROM
//! over a serial link and reads them back for verification.
//!
//! # Architecture
//!
//! - `ucfg-core` - the protocol engine: frame codec, session state
//!   machine, transfer/verification policy
//! - `ucfg-serial` - the `serialport`-backed link driver
//! - `ucfg-dummy` - an in-process device emulator behind the same link
//!   trait, used by tests and the `selftest` command
//!
//! The command modules here stay thin: load files, open a session, call
//! into the transfer engine, print results.

mod cli;
mod commands;
mod config;

use std::path::PathBuf;

use clap::Parser;
use cli::{Cli, Commands};
use config::AppConfig;

/// Default log filter for a given `-v` count. `RUST_LOG` still wins.
fn verbosity_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(verbosity_filter(cli.verbose)),
    )
    .init();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yml"));
    let mut config = match AppConfig::load_or_create(&config_path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Problem with config file, using default values: {}", e);
            AppConfig::default()
        }
    };

    // Command-line overrides are saved back, becoming the new defaults.
    let mut save_overrides = false;
    if let Some(port) = cli.port {
        config.serial_port = port;
        save_overrides = true;
    }
    if let Some(baud) = cli.baud {
        config.baud = baud;
        save_overrides = true;
    }
    if save_overrides {
        if let Err(e) = config.save(&config_path) {
            log::warn!("Cannot update config file {}: {}", config_path.display(), e);
        }
    }

    match cli.command {
        Commands::Flash {
            input,
            output,
            no_verify,
        } => commands::flash::run_flash(&config, &input, output.as_deref(), !no_verify),
        Commands::Read { input } => commands::read::run_read(&config, &input),
        Commands::Query { input } => commands::query::run_query(&input),
        Commands::GenHeader { input, output } => commands::gen::run_gen_header(&input, &output),
        Commands::GenExample { output } => commands::gen::run_gen_example(&output),
        Commands::GenConfig { output } => commands::gen::run_gen_config(&output),
        Commands::Selftest { size } => commands::selftest::run_selftest(&config, size),
    }
}
