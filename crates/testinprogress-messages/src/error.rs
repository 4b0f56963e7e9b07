// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for testinprogress-messages

use thiserror::Error;

/// Errors raised by a message channel while initialising, sending or shutting down
#[derive(Debug, Error)]
pub enum TransportError {
    /// Error writing to or connecting the underlying transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error encoding a message
    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),

    /// `send` or `shutdown` was called before `init`
    #[error("Message channel is not initialized")]
    NotInitialized,

    /// The channel has already been shut down
    #[error("Message channel is closed")]
    Closed,

    /// The transport refused the operation
    #[error("Transport rejected {operation}: {message}")]
    Rejected {
        /// Channel operation that failed (`init`, `send` or `shutdown`)
        operation: &'static str,
        /// Description of the failure
        message: String,
    },
}

/// Errors that can occur while decoding or validating a message stream
#[derive(Debug, Error)]
pub enum MessagesError {
    /// Error parsing JSON
    #[error("JSON parse error on line {line}: {source}")]
    JsonParse {
        /// 1-based line number in the stream
        line: usize,
        /// Underlying decode error
        source: serde_json::Error,
    },

    /// Error reading a recorded stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream violates the ordering rules of the protocol
    #[error("Protocol violation in run '{run_id}': {message}")]
    Protocol {
        /// Run whose stream is inconsistent
        run_id: String,
        /// Description of the violation
        message: String,
    },
}
