//! Self-test command implementation
//!
//! Exercises the full protocol stack against the in-process emulated
//! device: generate a random variable list, flash it with verification,
//! then read everything back and compare.

use ucfg_core::session::Session;
use ucfg_core::transfer;
use ucfg_core::variable;
use ucfg_dummy::DummyUc;

use crate::config::AppConfig;

/// Run the self test with a random list of `size` bytes.
pub fn run_selftest(config: &AppConfig, size: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let size = size.unwrap_or(config.test_size);
    let list = variable::random_list(size);
    println!(
        "Generated {} random variables occupying {} bytes",
        list.len(),
        list.total_size()
    );

    let mut session = Session::new(DummyUc::new_default());
    session.connect(config.retries)?;

    let sent = transfer::send_list(&mut session, &list, true, config.retries);
    if sent != list.len() {
        return Err(format!("Sent only {} of {} variables", sent, list.len()).into());
    }
    println!("Sent and verified {} variables", sent);

    let report = transfer::read_list(&mut session, &list, config.retries)
        .ok_or("Error reading data back from emulated device")?;
    let _ = session.disconnect();

    for entry in report.entries.iter().filter(|e| !e.matched) {
        log::warn!(
            "Mismatch on {}: expected {}, read {:?}",
            entry.name,
            entry.expected,
            entry.read
        );
    }
    println!(
        "Read back {} of {} variables correctly",
        report.matched_count(),
        report.len()
    );

    if report.all_matched() {
        println!("Self test passed.");
        Ok(())
    } else {
        Err("Self test failed, check logs".into())
    }
}
