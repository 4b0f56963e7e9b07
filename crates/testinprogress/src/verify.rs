// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Verification of recorded message streams

use std::io::Read;
use std::path::Path;

use testinprogress_messages::{MessagesError, RunStreamSummary, validate_stream};
use tracing::info;

/// Read a recorded stream, `-` meaning stdin
///
/// # Errors
///
/// Returns `MessagesError::Io` if the input cannot be read.
pub fn read_stream(path: &Path) -> Result<String, MessagesError> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        Ok(input)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Decode and validate a recorded stream, logging one line per run
///
/// # Errors
///
/// Returns the read failure, the first undecodable line, or the first protocol
/// violation.
pub fn verify(path: &Path) -> Result<Vec<RunStreamSummary>, MessagesError> {
    let summaries = validate_stream(&read_stream(path)?)?;
    for summary in &summaries {
        info!(
            run_id = %summary.run_id,
            messages = summary.messages,
            leaves = summary.leaves,
            "run stream is valid"
        );
    }
    Ok(summaries)
}
