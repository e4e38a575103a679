//! Flash command implementation

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use ucfg_core::transfer;
use ucfg_core::variable::yaml;

use crate::commands;
use crate::config::AppConfig;

/// Run the flash command: load the definitions, optionally emit the C
/// header, then send every variable with read-back verification.
pub fn run_flash(
    config: &AppConfig,
    input: &Path,
    output: Option<&Path>,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let list = yaml::load_definitions(input)
        .map_err(|e| format!("Error loading input file {}: {}", input.display(), e))?;

    if let Some(output) = output {
        commands::gen::run_gen_header_with(&list, output)?;
    }

    let mut session = commands::open_session(config)?;

    let pb = ProgressBar::new(list.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    // A partial batch restarts from address 0, matching the firmware
    // recovery model: every variable is rewritten.
    let mut sent = 0;
    for attempt in 1..=config.retries {
        pb.set_position(0);
        sent = transfer::send_list_with(&mut session, &list, verify, config.retries, |var| {
            pb.inc(1);
            pb.set_message(var.name().to_string());
        });
        if sent == list.len() {
            break;
        }
        log::warn!(
            "Sent {} of {} variables on attempt number {}",
            sent,
            list.len(),
            attempt
        );
    }
    let _ = session.disconnect();

    if sent != list.len() {
        pb.abandon_with_message("failed");
        return Err("Unable to send data to microcontroller, check logs".into());
    }
    pb.finish_with_message("done");

    println!("Flashed:");
    println!("-----------------");
    for var in &list {
        println!("{}: {}", var.name(), var.value());
    }
    println!("-----------------");
    if verify {
        println!("Successfully verified {} bytes.", list.total_size());
    } else {
        println!("Sent {} bytes (verification skipped).", list.total_size());
    }

    Ok(())
}
