// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! In-memory capturing senders
//!
//! [`CapturingSenderFactory`] keeps one transcript per sender it creates, i.e. one per
//! run, so tests can inspect exactly what each run would have put on the wire. A
//! [`FaultPlan`] makes the created senders fail on demand.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{MessagesError, TransportError};
use crate::message::Message;
use crate::sender::{ChannelState, MessageSender, MessageSenderFactory};
use crate::stream::parse_stream;

/// Failures to inject into every sender created by a factory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Make `init` fail
    pub fail_init: bool,
    /// Make the n-th `send` call fail (1-based, counting every attempt)
    pub fail_send_at: Option<usize>,
    /// Make `shutdown` fail
    pub fail_shutdown: bool,
}

impl FaultPlan {
    /// No injected failures
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Fail `init`
    #[must_use]
    pub fn failing_init() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    /// Fail the n-th `send` call
    #[must_use]
    pub fn failing_send_at(call: usize) -> Self {
        Self {
            fail_send_at: Some(call),
            ..Self::default()
        }
    }

    /// Fail `shutdown`
    #[must_use]
    pub fn failing_shutdown() -> Self {
        Self {
            fail_shutdown: true,
            ..Self::default()
        }
    }
}

/// Everything one sender saw
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    /// Encoded lines that were successfully sent
    pub lines: Vec<String>,
    /// Number of `send` calls, including failed ones
    pub send_attempts: usize,
    /// Whether `init` succeeded
    pub initialized: bool,
    /// Whether `shutdown` succeeded
    pub closed: bool,
}

impl Transcript {
    /// Decode the captured lines
    ///
    /// # Errors
    ///
    /// Returns `MessagesError::JsonParse` if a captured line does not decode.
    pub fn messages(&self) -> Result<Vec<Message>, MessagesError> {
        parse_stream(&self.lines.join("\n"))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sender recording into a shared transcript
#[derive(Debug)]
pub struct CapturingSender {
    transcript: Arc<Mutex<Transcript>>,
    faults: FaultPlan,
    state: ChannelState,
}

impl CapturingSender {
    /// Create a standalone capturing sender and a handle to its transcript
    #[must_use]
    pub fn new(faults: FaultPlan) -> (Self, Arc<Mutex<Transcript>>) {
        let transcript = Arc::new(Mutex::new(Transcript::default()));
        let sender = Self {
            transcript: Arc::clone(&transcript),
            faults,
            state: ChannelState::Idle,
        };
        (sender, transcript)
    }
}

impl MessageSender for CapturingSender {
    fn init(&mut self) -> Result<(), TransportError> {
        if self.faults.fail_init {
            return Err(TransportError::Rejected {
                operation: "init",
                message: "injected init failure".to_string(),
            });
        }
        self.state = ChannelState::Open;
        lock(&self.transcript).initialized = true;
        Ok(())
    }

    fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        let mut transcript = lock(&self.transcript);
        transcript.send_attempts += 1;
        self.state.ensure_open()?;
        if self.faults.fail_send_at == Some(transcript.send_attempts) {
            return Err(TransportError::Rejected {
                operation: "send",
                message: format!("injected failure on send #{}", transcript.send_attempts),
            });
        }
        transcript.lines.push(message.to_json_line()?);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), TransportError> {
        self.state.ensure_open()?;
        self.state = ChannelState::Closed;
        if self.faults.fail_shutdown {
            return Err(TransportError::Rejected {
                operation: "shutdown",
                message: "injected shutdown failure".to_string(),
            });
        }
        lock(&self.transcript).closed = true;
        Ok(())
    }
}

/// Factory keeping the transcript of every sender it created
#[derive(Debug, Default)]
pub struct CapturingSenderFactory {
    transcripts: Mutex<Vec<Arc<Mutex<Transcript>>>>,
    faults: FaultPlan,
}

impl CapturingSenderFactory {
    /// Factory whose senders never fail
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose senders fail according to `faults`
    #[must_use]
    pub fn with_faults(faults: FaultPlan) -> Self {
        Self {
            transcripts: Mutex::new(Vec::new()),
            faults,
        }
    }

    /// Number of senders created so far
    #[must_use]
    pub fn sender_count(&self) -> usize {
        lock(&self.transcripts).len()
    }

    /// Snapshot of every transcript, in sender creation order
    #[must_use]
    pub fn transcripts(&self) -> Vec<Transcript> {
        lock(&self.transcripts)
            .iter()
            .map(|transcript| lock(transcript).clone())
            .collect()
    }

    /// Decoded messages of every transcript, in sender creation order
    ///
    /// # Errors
    ///
    /// Returns `MessagesError::JsonParse` if a captured line does not decode.
    pub fn messages(&self) -> Result<Vec<Vec<Message>>, MessagesError> {
        self.transcripts().iter().map(Transcript::messages).collect()
    }
}

impl MessageSenderFactory for CapturingSenderFactory {
    fn create_sender(&self) -> Box<dyn MessageSender> {
        let (sender, transcript) = CapturingSender::new(self.faults.clone());
        lock(&self.transcripts).push(transcript);
        Box::new(sender)
    }
}
