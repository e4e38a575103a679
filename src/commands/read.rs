//! Read command implementation

use std::path::Path;

use ucfg_core::transfer;
use ucfg_core::variable::yaml;

use crate::commands;
use crate::config::AppConfig;

/// Read every variable back from the device and print the comparison
/// against the definition file.
pub fn run_read(config: &AppConfig, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let list = yaml::load_definitions(input)
        .map_err(|e| format!("Error loading input file {}: {}", input.display(), e))?;

    let mut session = commands::open_session(config)?;
    let report = transfer::read_list(&mut session, &list, config.retries);
    let _ = session.disconnect();

    let Some(report) = report else {
        return Err("Error reading data from microcontroller.".into());
    };

    println!(
        "{:<32}{:<20}{:<20}{:<8}",
        "Variable", "Value", "Read", "Match"
    );
    for entry in &report.entries {
        let read = match &entry.read {
            Some(value) => value.to_string(),
            None => "-".to_string(),
        };
        println!(
            "{:<32}{:<20}{:<20}{:<8}",
            entry.name,
            entry.expected,
            read,
            if entry.matched { "yes" } else { "NO" }
        );
    }
    println!(
        "{} of {} variables matched.",
        report.matched_count(),
        report.len()
    );

    if report.all_matched() {
        Ok(())
    } else {
        Err("Read values do not all match the definition file".into())
    }
}
