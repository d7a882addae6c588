//! Run metadata capture: commit hash, command line, environment snapshot
//!
//! Commit-hash capture is deliberately best-effort: absence of version
//! control, or `git` itself being unavailable, must not prevent experiment
//! creation.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

use crate::container::write_pretty_json;
use crate::error::Result;

/// Write the current git HEAD hash to `path`, silently skipping on any
/// failure (not a repository, git missing, ...).
pub(crate) fn capture_commit_hash(path: &Path) {
    let output = match Command::new("git").args(["rev-parse", "HEAD"]).output() {
        Ok(output) => output,
        Err(err) => {
            tracing::debug!(%err, "commit hash capture skipped: git unavailable");
            return;
        }
    };

    if !output.status.success() {
        tracing::debug!("commit hash capture skipped: not a git repository");
        return;
    }

    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if let Err(err) = fs::write(path, format!("{hash}\n")) {
        tracing::debug!(%err, "commit hash capture skipped: write failed");
    }
}

/// Persist the invocation's argument vector, joined by spaces. Arguments
/// that are not valid unicode are captured lossily rather than aborting the
/// run.
pub(crate) fn capture_command(path: &Path) -> Result<()> {
    let command = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    fs::write(path, format!("{command}\n"))?;
    Ok(())
}

/// Persist a JSON snapshot of the process environment. Entries that are not
/// valid unicode are captured lossily rather than aborting the run.
pub(crate) fn capture_environ(path: &Path) -> Result<()> {
    let environ: BTreeMap<String, String> = std::env::vars_os()
        .map(|(key, value)| {
            (
                key.to_string_lossy().into_owned(),
                value.to_string_lossy().into_owned(),
            )
        })
        .collect();
    write_pretty_json(path, &environ)
}
