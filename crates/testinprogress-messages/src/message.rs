// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Wire message types
//!
//! Every record on the wire is one JSON object on its own line. The `messageId`
//! field carries the kind tag; `runId` and `timestamp` are present on every record.
//!
//! ```text
//! {"runId":"Suite1-smoke","timestamp":"2026-01-17T02:33:06Z","messageId":"TESTC","totalMethodCount":2}
//! {"runId":"Suite1-smoke","timestamp":"2026-01-17T02:33:06Z","messageId":"TSTTREE","testId":"1","name":"smoke","parentId":null,"isContainer":true,"childCount":1}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// A single record sent to the observer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Run this record belongs to
    pub run_id: String,
    /// Emission time
    pub timestamp: DateTime<Utc>,
    /// Kind-specific payload, tagged by `messageId`
    #[serde(flatten)]
    pub event: Event,
}

impl Message {
    /// Create a message stamped with the current time
    #[must_use]
    pub fn new(run_id: impl Into<String>, event: Event) -> Self {
        Self::at(run_id, Utc::now(), event)
    }

    /// Create a message with an explicit timestamp
    #[must_use]
    pub fn at(run_id: impl Into<String>, timestamp: DateTime<Utc>, event: Event) -> Self {
        Self {
            run_id: run_id.into(),
            timestamp,
            event,
        }
    }

    /// Kind tag of this message
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        self.event.kind()
    }

    /// Encode as a single JSON line, without the trailing newline
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Json` if serialization fails.
    pub fn to_json_line(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(TransportError::from)
    }
}

/// Payload of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "messageId")]
pub enum Event {
    /// First record of every run
    #[serde(rename = "TESTC", rename_all = "camelCase")]
    RunStarted {
        /// Number of distinct test methods announced in the tree
        total_method_count: usize,
    },
    /// One node of the test tree, announced before any test starts
    #[serde(rename = "TSTTREE", rename_all = "camelCase")]
    TreeNode {
        /// Node identifier
        test_id: String,
        /// Display name
        name: String,
        /// Parent identifier, `None` for the run root
        parent_id: Option<String>,
        /// Whether the node groups other nodes (run or class)
        is_container: bool,
        /// Number of direct children, 1 for a method
        child_count: usize,
    },
    /// A test method started (or was skipped)
    #[serde(rename = "TESTS", rename_all = "camelCase")]
    TestStarted {
        /// Method identifier
        test_id: String,
        /// Display name (`method(class)`)
        name: String,
        /// Set when this is the placeholder start of a skipped method
        is_skipped: bool,
    },
    /// A test method finished
    #[serde(rename = "TESTE", rename_all = "camelCase")]
    TestEnded {
        /// Method identifier
        test_id: String,
        /// Display name (`method(class)`)
        name: String,
        /// Set when the method was skipped
        is_skipped: bool,
    },
    /// A test method failed; always followed by a `TestEnded` for the same id
    #[serde(rename = "ERROR", rename_all = "camelCase")]
    TestError {
        /// Method identifier
        test_id: String,
        /// Display name (`method(class)`)
        name: String,
        /// Formatted failure trace
        trace: String,
    },
    /// Last record of every run
    #[serde(rename = "RUNTIME", rename_all = "camelCase")]
    RunEnded {
        /// Run end timestamp minus run start timestamp
        elapsed_millis: i64,
    },
}

impl Event {
    /// Kind tag of this event
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::RunStarted { .. } => MessageKind::RunStarted,
            Self::TreeNode { .. } => MessageKind::TreeNode,
            Self::TestStarted { .. } => MessageKind::TestStarted,
            Self::TestEnded { .. } => MessageKind::TestEnded,
            Self::TestError { .. } => MessageKind::TestError,
            Self::RunEnded { .. } => MessageKind::RunEnded,
        }
    }

    /// Identifier of the node this event refers to, if any
    #[must_use]
    pub fn test_id(&self) -> Option<&str> {
        match self {
            Self::TreeNode { test_id, .. }
            | Self::TestStarted { test_id, .. }
            | Self::TestEnded { test_id, .. }
            | Self::TestError { test_id, .. } => Some(test_id),
            Self::RunStarted { .. } | Self::RunEnded { .. } => None,
        }
    }

    /// Whether the event is flagged as belonging to a skipped method
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            Self::TestStarted {
                is_skipped: true,
                ..
            } | Self::TestEnded {
                is_skipped: true,
                ..
            }
        )
    }
}

/// Stable kind tags consumers can match on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `TESTC`
    RunStarted,
    /// `TSTTREE`
    TreeNode,
    /// `TESTS`
    TestStarted,
    /// `TESTE`
    TestEnded,
    /// `ERROR`
    TestError,
    /// `RUNTIME`
    RunEnded,
}

impl MessageKind {
    /// The `messageId` tag written on the wire
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunStarted => "TESTC",
            Self::TreeNode => "TSTTREE",
            Self::TestStarted => "TESTS",
            Self::TestEnded => "TESTE",
            Self::TestError => "ERROR",
            Self::RunEnded => "RUNTIME",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
