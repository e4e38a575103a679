//! Query command implementation

use std::path::Path;

use ucfg_core::variable::yaml;

/// Print the variables in a definition file and the total EEPROM space
/// they need, without touching the device.
pub fn run_query(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let list = yaml::load_definitions(input)
        .map_err(|e| format!("Error loading query file {}: {}", input.display(), e))?;

    for var in &list {
        println!("{}: {}", var.name(), var.value());
    }
    println!("Variables require a total of {} bytes", list.total_size());

    Ok(())
}
