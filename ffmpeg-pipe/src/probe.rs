use std::process::{Command, Stdio};

use crate::error::{EncoderError, Result, spawn_error};

/// Runs `<program> -version` and returns the first line of its output,
/// e.g. `ffmpeg version 7.1 Copyright (c) ...`.
pub fn probe_version(program: &str) -> Result<String> {
    let output = Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|source| spawn_error(program, source))?;

    if !output.status.success() {
        return Err(EncoderError::EncoderExitedAbnormally {
            code: output.status.code(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}
