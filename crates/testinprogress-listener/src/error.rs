// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for testinprogress-listener

use testinprogress_messages::TransportError;
use thiserror::Error;

use crate::session::SessionState;

/// Errors that end or prevent a run's reporting session
///
/// None of these ever reach the host engine; the listener logs them and drops the
/// session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The message channel could not be opened
    #[error("Could not initialize message sender: {0}")]
    Init(#[source] TransportError),

    /// Writing or closing the message channel failed
    #[error("Message channel failed: {0}")]
    Transport(#[source] TransportError),

    /// The session is not in a state that accepts this callback
    #[error("Session is {state:?}, callback ignored")]
    Inactive {
        /// State the session was in
        state: SessionState,
    },
}
