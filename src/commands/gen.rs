//! File generation commands: C header, example definitions, app config

use std::fmt::Write as _;
use std::path::Path;

use ucfg_core::variable::{yaml, VariableList};

use crate::config::AppConfig;

/// Generate a C header file from a variable definition file.
pub fn run_gen_header(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let list = yaml::load_definitions(input)
        .map_err(|e| format!("Error loading input file {}: {}", input.display(), e))?;
    run_gen_header_with(&list, output)
}

/// Generate a C header file from an already-loaded variable list.
///
/// Each variable becomes a doc-commented `#define` mapping its name to
/// its EEPROM offset. List validation already guarantees the names are
/// usable as C identifiers.
pub fn run_gen_header_with(
    list: &VariableList,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if list.is_empty() {
        log::warn!("Generating a C header file with no variables");
    }
    let header = render_header(list, output);
    std::fs::write(output, header)
        .map_err(|e| format!("Error writing header file {}: {}", output.display(), e))?;
    log::info!("Saved C header file {}", output.display());
    Ok(())
}

fn render_header(list: &VariableList, output: &Path) -> String {
    let mut out = String::new();
    out.push_str("#ifndef UCCONFIG_GEN_H\n");
    out.push_str("#define UCCONFIG_GEN_H\n");
    out.push_str("/*!\n");
    let _ = writeln!(out, "\t@file {}", output.display());
    let _ = writeln!(
        out,
        "\t@brief ucfg v{} automatically generated C header file.",
        env!("CARGO_PKG_VERSION")
    );
    out.push_str("\t@details Include this file in embedded program code.\n");
    out.push_str("*/\n");

    for (i, var) in list.iter().enumerate() {
        out.push_str("/*!\n");
        let _ = writeln!(out, "\t@brief {}", var.description());
        out.push_str("\t@details The variable has the following parameters:\n");
        let _ = writeln!(out, "\t - Minimum Value: {}", var.min());
        let _ = writeln!(out, "\t - Maximum Value: {}", var.max());
        let _ = writeln!(out, "\t - Flashed Value: {}", var.value());
        let _ = writeln!(out, "\t - Variable Type: {}", var.data_type());
        out.push_str("\tThe hexadecimal number is the variable's location in non-volatile memory.\n");
        out.push_str("*/\n");
        let _ = writeln!(out, "#define {}  {:#x}", var.name(), list.address_of(i));
    }

    out.push_str("\n#endif\n");
    out
}

/// The commented example definition file, demonstrating one variable.
const EXAMPLE_DEFINITIONS: &str = "\
# Example variable definition file demonstrating correct layout.
# There are six required parameters for each variable:
#\tname - The name of the variable, must conform to C naming convention.
#\tdesc - A description of the variable, used to populate C header file comments.
#\tvalue - The variable value flashed to the microcontroller.
#\tdataType - A valid C type for the variable, options are:
#\t\tuint8_t - Unsigned 8-bit integer.
#\t\tint8_t - Signed 8-bit integer.
#\t\tuint16_t - Unsigned 16-bit integer.
#\t\tint16_t - Signed 16-bit integer.
#\t\tuint32_t - Unsigned 32-bit integer.
#\t\tint32_t - Signed 32-bit integer.
#\t\tfloat - Floating point, up to four decimal digits of precision.
#\t\tchar - An ASCII character, valid from ASCII 32 to ASCII 127.
#\tmax - The maximum allowed value, at most the variable type's maximum.
#\tmin - The minimum allowed value, at least the variable type's minimum.

# A single variable is demonstrated as:
- name: DELAY
  desc: Millisecond delay between LED toggles
  value: 500
  dataType: uint16_t
  max: 2000
  min: 1
";

/// Write the commented example variable definition file.
pub fn run_gen_example(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(output, EXAMPLE_DEFINITIONS)
        .map_err(|e| format!("Error writing example file {}: {}", output.display(), e))?;
    println!("Generated example definition file {}", output.display());
    Ok(())
}

/// Write an app configuration file holding the default parameters.
pub fn run_gen_config(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    AppConfig::default().save(output)?;
    println!("Generated config file {} with default parameters", output.display());
    Ok(())
}
