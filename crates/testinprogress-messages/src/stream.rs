// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Decoding and validation of recorded message streams
//!
//! Streams are newline-delimited JSON. [`parse_stream`] decodes a complete recording,
//! [`StreamValidator`] checks the per-run ordering rules incrementally:
//!
//! - the first record of a run is `TESTC`, nothing follows `RUNTIME`
//! - `TSTTREE` records all precede the first `TESTS`
//! - `TESTS`, `TESTE` and `ERROR` only reference announced leaf nodes
//! - every `ERROR` is later followed by a `TESTE` for the same id
//! - a skipped `TESTS` is directly followed by its skipped `TESTE`

use std::collections::{HashMap, HashSet};

use crate::error::MessagesError;
use crate::message::{Event, Message};

/// Decode a single line
///
/// # Errors
///
/// Returns `MessagesError::JsonParse` if the line is not a valid message.
pub fn parse_line(line: &str) -> Result<Message, MessagesError> {
    serde_json::from_str(line.trim()).map_err(|source| MessagesError::JsonParse { line: 1, source })
}

/// Decode a newline-delimited stream, skipping blank lines
///
/// # Errors
///
/// Returns `MessagesError::JsonParse` with the offending line number.
pub fn parse_stream(input: &str) -> Result<Vec<Message>, MessagesError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line.trim())
                .map_err(|source| MessagesError::JsonParse { line: idx + 1, source })
        })
        .collect()
}

#[derive(Debug, Default)]
struct RunState {
    ended: bool,
    tests_started: bool,
    leaves: HashSet<String>,
    awaiting_end: HashSet<String>,
    pending_skip: Option<String>,
    messages: usize,
}

/// Per-run outcome of a validated stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStreamSummary {
    /// Run identifier
    pub run_id: String,
    /// Number of records seen for the run
    pub messages: usize,
    /// Number of announced leaf nodes
    pub leaves: usize,
}

/// Incremental checker for the protocol ordering rules
#[derive(Debug, Default)]
pub struct StreamValidator {
    runs: HashMap<String, RunState>,
    order: Vec<String>,
}

impl StreamValidator {
    /// Create an empty validator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one message
    ///
    /// # Errors
    ///
    /// Returns `MessagesError::Protocol` on the first rule the message breaks.
    pub fn process(&mut self, message: &Message) -> Result<(), MessagesError> {
        let run_id = message.run_id.as_str();
        let violation = |text: String| MessagesError::Protocol {
            run_id: run_id.to_string(),
            message: text,
        };

        if !self.runs.contains_key(run_id) {
            if !matches!(message.event, Event::RunStarted { .. }) {
                return Err(violation(format!(
                    "first record is {} instead of TESTC",
                    message.kind()
                )));
            }
            self.runs.insert(run_id.to_string(), RunState::default());
            self.order.push(run_id.to_string());
            return self.bump(run_id);
        }

        let Some(state) = self.runs.get_mut(run_id) else {
            return Err(violation("run state missing".to_string()));
        };
        if state.ended {
            return Err(violation(format!("{} after RUNTIME", message.kind())));
        }
        if let Some(skipped) = state.pending_skip.take() {
            let closes_skip = matches!(
                &message.event,
                Event::TestEnded { test_id, is_skipped: true, .. } if *test_id == skipped
            );
            if !closes_skip {
                return Err(violation(format!(
                    "skipped test {skipped} is not directly followed by its skipped TESTE"
                )));
            }
        }

        match &message.event {
            Event::RunStarted { .. } => return Err(violation("duplicate TESTC".to_string())),
            Event::TreeNode {
                test_id,
                is_container,
                ..
            } => {
                if state.tests_started {
                    return Err(violation(format!("TSTTREE {test_id} after a TESTS")));
                }
                if !is_container {
                    state.leaves.insert(test_id.clone());
                }
            }
            Event::TestStarted {
                test_id,
                is_skipped,
                ..
            } => {
                if !state.leaves.contains(test_id) {
                    return Err(violation(format!("TESTS for unannounced test {test_id}")));
                }
                state.tests_started = true;
                if *is_skipped {
                    state.pending_skip = Some(test_id.clone());
                }
            }
            Event::TestError { test_id, .. } => {
                if !state.leaves.contains(test_id) {
                    return Err(violation(format!("ERROR for unannounced test {test_id}")));
                }
                state.awaiting_end.insert(test_id.clone());
            }
            Event::TestEnded { test_id, .. } => {
                if !state.leaves.contains(test_id) {
                    return Err(violation(format!("TESTE for unannounced test {test_id}")));
                }
                state.awaiting_end.remove(test_id);
            }
            Event::RunEnded { .. } => {
                if let Some(test_id) = state.awaiting_end.iter().next() {
                    return Err(violation(format!("ERROR for {test_id} never followed by TESTE")));
                }
                state.ended = true;
            }
        }
        self.bump(run_id)
    }

    fn bump(&mut self, run_id: &str) -> Result<(), MessagesError> {
        if let Some(state) = self.runs.get_mut(run_id) {
            state.messages += 1;
        }
        Ok(())
    }

    /// Check that every run seen was ended and summarize each one
    ///
    /// # Errors
    ///
    /// Returns `MessagesError::Protocol` for the first run without `RUNTIME`.
    pub fn finish(self) -> Result<Vec<RunStreamSummary>, MessagesError> {
        let mut runs = self.runs;
        self.order
            .into_iter()
            .map(|run_id| {
                let state = runs.remove(&run_id).unwrap_or_default();
                if !state.ended {
                    return Err(MessagesError::Protocol {
                        run_id,
                        message: "stream ended without RUNTIME".to_string(),
                    });
                }
                Ok(RunStreamSummary {
                    run_id,
                    messages: state.messages,
                    leaves: state.leaves.len(),
                })
            })
            .collect()
    }
}

/// Decode and validate a complete stream
///
/// # Errors
///
/// Returns the first decode error or protocol violation.
pub fn validate_stream(input: &str) -> Result<Vec<RunStreamSummary>, MessagesError> {
    let mut validator = StreamValidator::new();
    for message in parse_stream(input)? {
        validator.process(&message)?;
    }
    validator.finish()
}
