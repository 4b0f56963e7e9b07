// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Per-run reporting session
//!
//! A session owns the identifier registry and the message sender of exactly one run
//! and moves through `Uninitialized → Active → Terminated`. Any transport failure
//! terminates it; `Terminated` is never left.

use testinprogress_messages::MessageSender;
use tracing::info;

use crate::emitter::EventEmitter;
use crate::error::SessionError;
use crate::failure::FailureCause;
use crate::host::MethodDescriptor;
use crate::registry::IdRegistry;
use crate::tree::TestTree;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, channel not opened yet
    Uninitialized,
    /// Channel open, callbacks are reported
    Active,
    /// Finished or failed; nothing more is sent
    Terminated,
}

/// A callback delivered to an active session
#[derive(Debug, Clone, Copy)]
pub enum Lifecycle<'a> {
    /// A method started
    TestStarted(&'a MethodDescriptor),
    /// A method passed
    TestSucceeded(&'a MethodDescriptor),
    /// A method failed, with its cause if the host reported one
    TestFailed(&'a MethodDescriptor, Option<&'a FailureCause>),
    /// A method was skipped
    TestSkipped(&'a MethodDescriptor),
    /// A method failed within its success percentage
    TestFailedWithinSuccessPercentage(&'a MethodDescriptor),
    /// The run finished
    RunEnded {
        /// Run end minus run start
        elapsed_millis: i64,
    },
}

/// Reporting state of one run
pub struct RunSession {
    run_key: String,
    registry: IdRegistry,
    sender: Box<dyn MessageSender>,
    state: SessionState,
}

impl RunSession {
    /// Create an uninitialised session around a fresh sender
    #[must_use]
    pub fn new(run_key: impl Into<String>, sender: Box<dyn MessageSender>) -> Self {
        Self {
            run_key: run_key.into(),
            registry: IdRegistry::new(),
            sender,
            state: SessionState::Uninitialized,
        }
    }

    /// Run key, also the `runId` of every record
    #[must_use]
    pub fn run_key(&self) -> &str {
        &self.run_key
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Identifiers allocated so far
    #[must_use]
    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }

    fn emitter(&mut self) -> EventEmitter<'_> {
        EventEmitter::new(&self.run_key, &self.registry, self.sender.as_mut())
    }

    /// Open the channel, announce the run and its tree
    ///
    /// # Errors
    ///
    /// `SessionError::Inactive` unless the session is uninitialised; otherwise the
    /// init or transport failure, after which the session is `Terminated`.
    pub fn start(&mut self, tree: &TestTree) -> Result<(), SessionError> {
        if self.state != SessionState::Uninitialized {
            return Err(SessionError::Inactive { state: self.state });
        }

        let mut emitter = self.emitter();
        let result = emitter
            .run_started(tree)
            .and_then(|()| emitter.announce_tree(tree));

        match result {
            Ok(()) => {
                self.state = SessionState::Active;
                info!(
                    run_id = %self.run_key,
                    classes = tree.class_count(),
                    methods = tree.method_count(),
                    "test progress session started"
                );
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Terminated;
                Err(e)
            }
        }
    }

    /// Report one callback
    ///
    /// Returns the state after the callback: `Terminated` once the run has ended.
    ///
    /// # Errors
    ///
    /// `SessionError::Inactive` if the session is not active; a transport failure,
    /// after which the session is `Terminated`.
    pub fn handle(&mut self, event: Lifecycle<'_>) -> Result<SessionState, SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::Inactive { state: self.state });
        }

        let mut emitter = self.emitter();
        let result = match event {
            Lifecycle::TestStarted(method) => emitter.test_started(method),
            Lifecycle::TestSucceeded(method) => emitter.test_succeeded(method),
            Lifecycle::TestFailed(method, failure) => emitter.test_failed(method, failure),
            Lifecycle::TestSkipped(method) => emitter.test_skipped(method),
            Lifecycle::TestFailedWithinSuccessPercentage(method) => {
                emitter.test_failed_within_success_percentage(method)
            }
            Lifecycle::RunEnded { elapsed_millis } => emitter.run_ended(elapsed_millis),
        };

        match result {
            Ok(()) => {
                if let Lifecycle::RunEnded { elapsed_millis } = event {
                    self.state = SessionState::Terminated;
                    info!(run_id = %self.run_key, elapsed_millis, "test progress session finished");
                }
                Ok(self.state)
            }
            Err(e) => {
                self.state = SessionState::Terminated;
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for RunSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunSession")
            .field("run_key", &self.run_key)
            .field("state", &self.state)
            .field("ids", &self.registry.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RunDescriptor;
    use similar_asserts::assert_eq;
    use std::sync::{Arc, Mutex};
    use testinprogress_messages::{CapturingSender, FaultPlan, Transcript};

    fn session(faults: FaultPlan) -> (RunSession, Arc<Mutex<Transcript>>) {
        let (sender, transcript) = CapturingSender::new(faults);
        (RunSession::new("Suite1-smoke", Box::new(sender)), transcript)
    }

    fn tree() -> TestTree {
        TestTree::build(&RunDescriptor::new("Suite1", Some("smoke")).with_method("pkg.Foo", "a"))
    }

    #[test]
    fn test_happy_path_state_transitions() {
        let (mut session, transcript) = session(FaultPlan::none());
        let method = MethodDescriptor::new("pkg.Foo", "a");
        assert_eq!(session.state(), SessionState::Uninitialized);

        session.start(&tree()).expect("start");
        assert_eq!(session.state(), SessionState::Active);

        let state = session
            .handle(Lifecycle::TestStarted(&method))
            .expect("started");
        assert_eq!(state, SessionState::Active);
        session
            .handle(Lifecycle::TestSucceeded(&method))
            .expect("succeeded");

        let state = session
            .handle(Lifecycle::RunEnded { elapsed_millis: 9 })
            .expect("ended");
        assert_eq!(state, SessionState::Terminated);
        assert!(transcript.lock().expect("lock").closed);
        assert_eq!(session.registry().len(), 3);
    }

    #[test]
    fn test_init_failure_terminates_without_activating() {
        let (mut session, transcript) = session(FaultPlan::failing_init());
        let result = session.start(&tree());
        assert!(matches!(result, Err(SessionError::Init(_))));
        assert_eq!(session.state(), SessionState::Terminated);
        assert_eq!(transcript.lock().expect("lock").send_attempts, 0);
    }

    #[test]
    fn test_terminated_is_absorbing() {
        let (mut session, transcript) = session(FaultPlan::failing_send_at(5));
        let method = MethodDescriptor::new("pkg.Foo", "a");
        // TESTC + 3 TSTTREE go through; the next write fails
        session.start(&tree()).expect("start");
        let result = session.handle(Lifecycle::TestStarted(&method));
        assert!(matches!(result, Err(SessionError::Transport(_))));
        assert_eq!(session.state(), SessionState::Terminated);

        let result = session.handle(Lifecycle::TestSucceeded(&method));
        assert!(matches!(
            result,
            Err(SessionError::Inactive {
                state: SessionState::Terminated
            })
        ));
        assert!(session.start(&tree()).is_err());
        assert_eq!(transcript.lock().expect("lock").send_attempts, 5);
    }

    #[test]
    fn test_handle_before_start_is_rejected() {
        let (mut session, _) = session(FaultPlan::none());
        let result = session.handle(Lifecycle::RunEnded { elapsed_millis: 0 });
        assert!(matches!(
            result,
            Err(SessionError::Inactive {
                state: SessionState::Uninitialized
            })
        ));
    }

    #[test]
    fn test_shutdown_failure_terminates() {
        let (mut session, _) = session(FaultPlan::failing_shutdown());
        session.start(&tree()).expect("start");
        let result = session.handle(Lifecycle::RunEnded { elapsed_millis: 1 });
        assert!(matches!(result, Err(SessionError::Transport(_))));
        assert_eq!(session.state(), SessionState::Terminated);
    }
}
