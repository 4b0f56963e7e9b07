// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Message channel capability and the writer-backed sender
//!
//! A [`MessageSender`] is created per run by a [`MessageSenderFactory`] and goes through
//! `init`, any number of `send` calls, then `shutdown`. Backends differ only in where
//! the newline-delimited JSON ends up.

use std::io::Write;

use tracing::trace;

use crate::error::TransportError;
use crate::message::Message;

/// A transport able to deliver messages to the observer
pub trait MessageSender: Send {
    /// Establish the transport
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if the observer cannot be reached.
    fn init(&mut self) -> Result<(), TransportError>;

    /// Write one message
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if the write fails or the channel is not open.
    fn send(&mut self, message: &Message) -> Result<(), TransportError>;

    /// Release the transport
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if closing fails.
    fn shutdown(&mut self) -> Result<(), TransportError>;
}

/// Creates one sender per run
pub trait MessageSenderFactory: Send + Sync {
    /// Create a fresh, uninitialised sender
    fn create_sender(&self) -> Box<dyn MessageSender>;
}

/// Lifecycle of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// `init` has not been called yet
    Idle,
    /// Messages may be sent
    Open,
    /// `shutdown` has been called
    Closed,
}

impl ChannelState {
    /// Check that a message may be written in this state
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init` and `Closed` after `shutdown`.
    pub fn ensure_open(self) -> Result<(), TransportError> {
        match self {
            Self::Open => Ok(()),
            Self::Idle => Err(TransportError::NotInitialized),
            Self::Closed => Err(TransportError::Closed),
        }
    }
}

/// Writes newline-delimited JSON to any [`Write`] implementation
///
/// Each message is flushed as soon as it is written so a streaming consumer sees
/// it immediately.
#[derive(Debug)]
pub struct WriterSender<W: Write + Send> {
    writer: W,
    state: ChannelState,
}

impl<W: Write + Send> WriterSender<W> {
    /// Wrap a writer
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            state: ChannelState::Idle,
        }
    }

    /// Current channel state
    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Recover the wrapped writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MessageSender for WriterSender<W> {
    fn init(&mut self) -> Result<(), TransportError> {
        if self.state == ChannelState::Closed {
            return Err(TransportError::Closed);
        }
        self.state = ChannelState::Open;
        Ok(())
    }

    fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        self.state.ensure_open()?;
        let mut line = message.to_json_line()?;
        line.push('\n');
        trace!(kind = %message.kind(), run_id = %message.run_id, "writing message");
        // One write per record keeps lines whole on a shared stdout
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), TransportError> {
        self.state.ensure_open()?;
        self.state = ChannelState::Closed;
        self.writer.flush()?;
        Ok(())
    }
}

/// Factory producing senders that write to standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSenderFactory;

impl MessageSenderFactory for StdoutSenderFactory {
    fn create_sender(&self) -> Box<dyn MessageSender> {
        Box::new(WriterSender::new(std::io::stdout()))
    }
}
