// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Replay of recorded test plans
//!
//! A plan lists runs and, for each run, the method invocations in execution order
//! with their outcome. Replaying a plan drives a [`TestListener`] exactly as a host
//! engine would, so an observer can be exercised without a real test engine.
//!
//! ```json
//! {
//!   "runs": [{
//!     "suite": "Suite1",
//!     "test": "smoke",
//!     "elapsed_ms": 120,
//!     "methods": [
//!       { "class": "pkg.FooTest", "method": "adds", "outcome": "pass" },
//!       { "class": "pkg.FooTest", "method": "divides",
//!         "outcome": { "fail": { "kind": "ArithmeticException", "message": "/ by zero" } } },
//!       { "class": "pkg.FooTest", "method": "later", "outcome": "skip" }
//!     ]
//!   }]
//! }
//! ```

use std::path::Path;
use std::thread;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use testinprogress_listener::{FailureCause, RunDescriptor, TestListener};
use tracing::{debug, info};

/// Errors loading a plan
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Error reading the plan file
    #[error("Failed to read plan {path}: {source}")]
    Read {
        /// Plan file
        path: String,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// The plan is not valid JSON or does not match the plan shape
    #[error("Invalid plan: {0}")]
    Json(#[from] serde_json::Error),
}

/// A set of runs to replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayPlan {
    /// Runs, in start order
    pub runs: Vec<RunPlan>,
}

/// One run of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPlan {
    /// Suite name
    pub suite: String,
    /// Sub-test name; the default name applies when absent or empty
    #[serde(default)]
    pub test: Option<String>,
    /// Reported run duration
    #[serde(default)]
    pub elapsed_ms: i64,
    /// Method invocations, in execution order
    #[serde(default)]
    pub methods: Vec<PlannedMethod>,
}

/// One method invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMethod {
    /// Declaring class
    pub class: String,
    /// Method name
    pub method: String,
    /// What the invocation does
    #[serde(default)]
    pub outcome: Outcome,
}

/// Result of an invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The method passed
    #[default]
    Pass,
    /// The method failed
    Fail {
        /// Exception or error type
        kind: String,
        /// Failure message
        #[serde(default)]
        message: String,
        /// Stack frames, innermost first
        #[serde(default)]
        frames: Vec<String>,
    },
    /// The method was skipped without running
    Skip,
}

/// Counts of what a replay reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Runs replayed
    pub runs: usize,
    /// Invocations that passed
    pub passed: usize,
    /// Invocations that failed
    pub failed: usize,
    /// Invocations that were skipped
    pub skipped: usize,
}

impl ReplaySummary {
    fn merge(self, other: Self) -> Self {
        Self {
            runs: self.runs + other.runs,
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
            skipped: self.skipped + other.skipped,
        }
    }
}

impl ReplayPlan {
    /// Parse a plan from JSON
    ///
    /// # Errors
    ///
    /// Returns `PlanError::Json` if the input does not describe a plan.
    pub fn from_json(input: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a plan from a file
    ///
    /// # Errors
    ///
    /// Returns `PlanError::Read` if the file cannot be read, `PlanError::Json` if
    /// its content is not a plan.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let input = std::fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&input)
    }

    /// Total number of invocations across runs
    #[must_use]
    pub fn invocation_count(&self) -> usize {
        self.runs.iter().map(|run| run.methods.len()).sum()
    }

    /// Replay every run, one after another or each on its own thread
    pub fn replay(&self, listener: &dyn TestListener, parallel: bool) -> ReplaySummary {
        info!(
            runs = self.runs.len(),
            invocations = self.invocation_count(),
            parallel,
            "replaying test plan"
        );

        if !parallel {
            return self
                .runs
                .iter()
                .map(|run| run.replay(listener))
                .fold(ReplaySummary::default(), ReplaySummary::merge);
        }

        thread::scope(|scope| {
            let handles: Vec<_> = self
                .runs
                .iter()
                .map(|run| scope.spawn(move || run.replay(listener)))
                .collect();
            handles
                .into_iter()
                .filter_map(|handle| handle.join().ok())
                .fold(ReplaySummary::default(), ReplaySummary::merge)
        })
    }
}

impl RunPlan {
    /// Host-side description of the run, every planned method declared
    #[must_use]
    pub fn descriptor(&self) -> RunDescriptor {
        self.methods.iter().fold(
            RunDescriptor::new(self.suite.as_str(), self.test.as_deref()),
            |run, m| run.with_method(&m.class, &m.method),
        )
    }

    /// Drive the listener through this run
    pub fn replay(&self, listener: &dyn TestListener) -> ReplaySummary {
        let mut run = self.descriptor();
        let mut summary = ReplaySummary {
            runs: 1,
            ..Default::default()
        };

        listener.on_run_start(&run);
        for planned in &self.methods {
            let invocation = run.invocation(&planned.class, &planned.method);
            match &planned.outcome {
                Outcome::Pass => {
                    listener.on_test_start(&invocation);
                    listener.on_test_success(&invocation);
                    summary.passed += 1;
                }
                Outcome::Fail {
                    kind,
                    message,
                    frames,
                } => {
                    let failure = frames
                        .iter()
                        .fold(FailureCause::new(kind.as_str(), message.as_str()), |cause, frame| {
                            cause.with_frame(frame.as_str())
                        });
                    listener.on_test_start(&invocation);
                    listener.on_test_failure(&invocation.with_failure(failure));
                    summary.failed += 1;
                }
                Outcome::Skip => {
                    listener.on_test_skipped(&invocation);
                    summary.skipped += 1;
                }
            }
        }

        run.finish_at(run.started_at + Duration::milliseconds(self.elapsed_ms));
        listener.on_run_finish(&run);
        debug!(suite = %self.suite, test = ?self.test, "run replayed");
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    const PLAN: &str = r#"{
        "runs": [{
            "suite": "Suite1",
            "test": "smoke",
            "elapsed_ms": 120,
            "methods": [
                { "class": "pkg.FooTest", "method": "adds", "outcome": "pass" },
                { "class": "pkg.FooTest", "method": "divides",
                  "outcome": { "fail": { "kind": "ArithmeticException", "message": "/ by zero" } } },
                { "class": "pkg.FooTest", "method": "later", "outcome": "skip" },
                { "class": "pkg.BarTest", "method": "implicit" }
            ]
        }]
    }"#;

    #[test]
    fn test_parse_plan() {
        let plan = ReplayPlan::from_json(PLAN).expect("plan");
        assert_eq!(plan.runs.len(), 1);
        assert_eq!(plan.invocation_count(), 4);
        let run = &plan.runs[0];
        assert_eq!(run.test.as_deref(), Some("smoke"));
        assert_eq!(run.methods[3].outcome, Outcome::Pass);
        assert_eq!(
            run.methods[1].outcome,
            Outcome::Fail {
                kind: "ArithmeticException".to_string(),
                message: "/ by zero".to_string(),
                frames: Vec::new(),
            }
        );
    }

    #[test]
    fn test_descriptor_declares_every_method() {
        let plan = ReplayPlan::from_json(PLAN).expect("plan");
        let run = plan.runs[0].descriptor();
        assert_eq!(run.suite_name, "Suite1");
        assert_eq!(run.methods.len(), 4);
    }

    #[test]
    fn test_invalid_plan() {
        assert!(matches!(
            ReplayPlan::from_json(r#"{"runs": [{"test": "no suite"}]}"#),
            Err(PlanError::Json(_))
        ));
    }

    #[test]
    fn test_summary_merge() {
        let a = ReplaySummary {
            runs: 1,
            passed: 2,
            failed: 0,
            skipped: 1,
        };
        let b = ReplaySummary {
            runs: 1,
            passed: 0,
            failed: 3,
            skipped: 0,
        };
        assert_eq!(
            a.merge(b),
            ReplaySummary {
                runs: 2,
                passed: 2,
                failed: 3,
                skipped: 1,
            }
        );
    }
}
