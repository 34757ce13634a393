//! Process exit contract.
//!
//! `Created` and `AlreadyExists` exit 0. A failed run exits 1 with its message
//! on stderr; errors before the run could start exit 2. Under GitHub Actions
//! the message is also emitted as an `::error::` workflow command so it shows
//! on the run summary.

use std::process::ExitCode;

use provisioning::ProvisioningResult;

/// Exit status for a failed provisioning run.
pub const EXIT_FAILED: u8 = 1;
/// Exit status when configuration or the trigger payload was unusable.
pub const EXIT_INVALID_INPUT: u8 = 2;

pub fn exit_status(result: &ProvisioningResult) -> u8 {
    match result {
        ProvisioningResult::Failed(_) => EXIT_FAILED,
        ProvisioningResult::Created(_) | ProvisioningResult::AlreadyExists => 0,
    }
}

pub fn exit_code(result: &ProvisioningResult) -> ExitCode {
    ExitCode::from(exit_status(result))
}

/// Writes `message` to stderr and, on a GitHub runner, as a workflow error.
pub fn surface_failure(message: &str) {
    eprintln!("Error: {message}");
    if running_in_actions() {
        println!("{}", error_command(message));
    }
}

fn running_in_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Formats an `::error::` workflow command with the message escaped so it
/// stays on one line.
pub fn error_command(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{escaped}")
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
