// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Progress-reporting listener
//!
//! [`ProgressListener`] is the [`TestListener`] a host registers. It opens one
//! session per run, routes every callback to the session of the callback's run and
//! contains all transport failures: a failed run is logged once, dropped from the
//! directory, and left to finish without reporting.

use std::sync::Arc;

use testinprogress_messages::{MessageSenderFactory, SocketSenderFactory};
use tracing::{debug, error, warn};

use crate::directory::SessionDirectory;
use crate::error::SessionError;
use crate::host::{RunContext, TestInvocation, TestListener};
use crate::session::{Lifecycle, RunSession, SessionState};
use crate::tree::TestTree;

/// Streams the lifecycle of every run to a progress observer
pub struct ProgressListener {
    factory: Arc<dyn MessageSenderFactory>,
    directory: SessionDirectory,
}

impl ProgressListener {
    /// Listener creating one sender per run from `factory`
    #[must_use]
    pub fn new(factory: Arc<dyn MessageSenderFactory>) -> Self {
        Self {
            factory,
            directory: SessionDirectory::new(),
        }
    }

    /// Listener reporting over TCP to the port named by the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(Arc::new(SocketSenderFactory::from_env()))
    }

    /// Sessions of the runs currently being reported
    #[must_use]
    pub fn directory(&self) -> &SessionDirectory {
        &self.directory
    }

    fn dispatch(&self, context: &dyn RunContext, event: Lifecycle<'_>) {
        let Some(result) = self
            .directory
            .dispatch(context.context_id(), |session| session.handle(event))
        else {
            debug!(context = %context.context_id(), "no live session, callback ignored");
            return;
        };

        match result {
            Ok(_) | Err(SessionError::Inactive { .. }) => {}
            Err(e) => {
                error!(
                    run_id = %context.run_key(),
                    error = %e,
                    "Test progress reporting failed, listener removed for this run"
                );
            }
        }
    }

    /// Whether a run is still being reported
    #[must_use]
    pub fn is_reporting(&self, context: &dyn RunContext) -> bool {
        self.directory
            .for_context(context.context_id())
            .is_some_and(|session| {
                session
                    .lock()
                    .is_ok_and(|s| s.state() == SessionState::Active)
            })
    }
}

impl std::fmt::Debug for ProgressListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressListener")
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

impl TestListener for ProgressListener {
    fn on_run_start(&self, context: &dyn RunContext) {
        let run_key = context.run_key();
        let tree = TestTree::build(context);
        let mut session = RunSession::new(run_key.as_str(), self.factory.create_sender());

        match session.start(&tree) {
            Ok(()) => {
                if self.directory.register(context.context_id(), session).is_some() {
                    warn!(
                        run_id = %run_key,
                        context = %context.context_id(),
                        "run started twice, previous session replaced"
                    );
                }
            }
            Err(e @ SessionError::Init(_)) => {
                error!(run_id = %run_key, error = %e, "Could not initialize test progress message sender");
            }
            Err(e) => {
                error!(
                    run_id = %run_key,
                    error = %e,
                    "Test progress reporting failed, listener removed for this run"
                );
            }
        }
    }

    fn on_run_finish(&self, context: &dyn RunContext) {
        let elapsed_millis = context.elapsed_millis();
        self.dispatch(context, Lifecycle::RunEnded { elapsed_millis });
    }

    fn on_test_start(&self, result: &dyn TestInvocation) {
        self.dispatch(result.context(), Lifecycle::TestStarted(result.method()));
    }

    fn on_test_success(&self, result: &dyn TestInvocation) {
        self.dispatch(result.context(), Lifecycle::TestSucceeded(result.method()));
    }

    fn on_test_failure(&self, result: &dyn TestInvocation) {
        self.dispatch(
            result.context(),
            Lifecycle::TestFailed(result.method(), result.failure()),
        );
    }

    fn on_test_skipped(&self, result: &dyn TestInvocation) {
        self.dispatch(result.context(), Lifecycle::TestSkipped(result.method()));
    }

    fn on_test_failed_within_success_percentage(&self, result: &dyn TestInvocation) {
        self.dispatch(
            result.context(),
            Lifecycle::TestFailedWithinSuccessPercentage(result.method()),
        );
    }
}
