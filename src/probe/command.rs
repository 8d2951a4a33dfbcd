//! Running client binaries with a deadline.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::ProbeError;

/// Run `program` with `args` and return its stdout.
///
/// Non-zero exit is an error. The child is killed if the deadline passes.
pub async fn run(program: &str, args: &[String], timeout: Duration) -> Result<String, ProbeError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, child)
        .await
        .map_err(|_| ProbeError::Timeout(timeout))?
        .map_err(|source| ProbeError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        tracing::debug!(
            program,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "Client exited unsuccessfully"
        );
        return Err(ProbeError::CommandFailed {
            program: program.to_string(),
            code: output.status.code(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Check that a client's output contains the expected marker
pub fn expect_output(program: &str, stdout: &str, marker: &str) -> Result<(), ProbeError> {
    if stdout.contains(marker) {
        Ok(())
    } else {
        Err(ProbeError::UnexpectedOutput {
            program: program.to_string(),
        })
    }
}
