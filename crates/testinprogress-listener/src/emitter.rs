// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Lifecycle callback to wire message translation
//!
//! | callback                      | records                         |
//! |-------------------------------|---------------------------------|
//! | run started                   | `TESTC`, then the `TSTTREE`s    |
//! | test started                  | `TESTS`                         |
//! | test succeeded                | `TESTE`                         |
//! | test failed                   | `ERROR`, `TESTE`                |
//! | test skipped                  | `TESTS`, `TESTE` (both skipped) |
//! | failed within success percent | nothing                         |
//! | run ended                     | `RUNTIME`, then channel closed  |

use testinprogress_messages::{Event, Message, MessageSender};
use tracing::debug;

use crate::error::SessionError;
use crate::failure::FailureCause;
use crate::host::MethodDescriptor;
use crate::registry::{IdRegistry, method_key};
use crate::tree::TestTree;

/// Trace sent when the host reports a failure without a cause
pub const MISSING_TRACE: &str = "<no failure cause reported>";

/// Writes the records of one run through its sender
///
/// The emitter borrows the session's registry and sender for the duration of a
/// single callback.
pub struct EventEmitter<'a> {
    run_key: &'a str,
    registry: &'a IdRegistry,
    sender: &'a mut dyn MessageSender,
}

impl<'a> EventEmitter<'a> {
    /// Borrow the parts of a session
    pub fn new(run_key: &'a str, registry: &'a IdRegistry, sender: &'a mut dyn MessageSender) -> Self {
        Self {
            run_key,
            registry,
            sender,
        }
    }

    fn emit(&mut self, event: Event) -> Result<(), SessionError> {
        let message = Message::new(self.run_key, event);
        debug!(run_id = %self.run_key, kind = %message.kind(), test_id = ?message.event.test_id(), "emitting");
        self.sender.send(&message).map_err(SessionError::Transport)
    }

    fn method_ids(&self, method: &MethodDescriptor) -> (String, String) {
        let test_id = self.registry.resolve(&method_key(self.run_key, method));
        (test_id, method.display_name())
    }

    /// Open the channel and announce the run with its declared method count
    ///
    /// # Errors
    ///
    /// `SessionError::Init` if the channel cannot be opened, `SessionError::Transport`
    /// if the first record cannot be written.
    pub fn run_started(&mut self, tree: &TestTree) -> Result<(), SessionError> {
        self.sender.init().map_err(SessionError::Init)?;
        self.emit(Event::RunStarted {
            total_method_count: tree.method_count(),
        })
    }

    /// Announce every node of the tree
    ///
    /// # Errors
    ///
    /// `SessionError::Transport` on the first failed write.
    pub fn announce_tree(&mut self, tree: &TestTree) -> Result<(), SessionError> {
        for node in tree.nodes(self.run_key, self.registry) {
            self.emit(node.into_event())?;
        }
        Ok(())
    }

    /// A method started
    ///
    /// # Errors
    ///
    /// `SessionError::Transport` if the write fails.
    pub fn test_started(&mut self, method: &MethodDescriptor) -> Result<(), SessionError> {
        let (test_id, name) = self.method_ids(method);
        self.emit(Event::TestStarted {
            test_id,
            name,
            is_skipped: false,
        })
    }

    /// A method passed
    ///
    /// # Errors
    ///
    /// `SessionError::Transport` if the write fails.
    pub fn test_succeeded(&mut self, method: &MethodDescriptor) -> Result<(), SessionError> {
        let (test_id, name) = self.method_ids(method);
        self.emit(Event::TestEnded {
            test_id,
            name,
            is_skipped: false,
        })
    }

    /// A method failed: its trace, then its end
    ///
    /// # Errors
    ///
    /// `SessionError::Transport` if either write fails.
    pub fn test_failed(
        &mut self,
        method: &MethodDescriptor,
        failure: Option<&FailureCause>,
    ) -> Result<(), SessionError> {
        let (test_id, name) = self.method_ids(method);
        let trace = failure.map_or_else(|| MISSING_TRACE.to_string(), FailureCause::render);
        self.emit(Event::TestError {
            test_id: test_id.clone(),
            name: name.clone(),
            trace,
        })?;
        self.emit(Event::TestEnded {
            test_id,
            name,
            is_skipped: false,
        })
    }

    /// A method was skipped: an instantaneous start/end pair
    ///
    /// # Errors
    ///
    /// `SessionError::Transport` if either write fails.
    pub fn test_skipped(&mut self, method: &MethodDescriptor) -> Result<(), SessionError> {
        let (test_id, name) = self.method_ids(method);
        self.emit(Event::TestStarted {
            test_id: test_id.clone(),
            name: name.clone(),
            is_skipped: true,
        })?;
        self.emit(Event::TestEnded {
            test_id,
            name,
            is_skipped: true,
        })
    }

    /// Reserved. The intended reporting of a failure within the success percentage
    /// was never defined, so nothing is sent.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub fn test_failed_within_success_percentage(
        &mut self,
        _method: &MethodDescriptor,
    ) -> Result<(), SessionError> {
        Ok(())
    }

    /// Send the elapsed time and close the channel
    ///
    /// # Errors
    ///
    /// `SessionError::Transport` if the write or the close fails.
    pub fn run_ended(&mut self, elapsed_millis: i64) -> Result<(), SessionError> {
        self.emit(Event::RunEnded { elapsed_millis })?;
        self.sender.shutdown().map_err(SessionError::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RunDescriptor;
    use similar_asserts::assert_eq;
    use testinprogress_messages::{CapturingSender, FaultPlan, MessageKind};

    fn kinds_and_ids(messages: &[Message]) -> Vec<(MessageKind, Option<String>)> {
        messages
            .iter()
            .map(|m| (m.kind(), m.event.test_id().map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_full_run_sequence() {
        let run = RunDescriptor::new("Suite1", Some("smoke"))
            .with_method("pkg.Foo", "a")
            .with_method("pkg.Foo", "b");
        let tree = TestTree::build(&run);
        let registry = IdRegistry::new();
        let (mut sender, transcript) = CapturingSender::new(FaultPlan::none());
        let a = MethodDescriptor::new("pkg.Foo", "a");
        let b = MethodDescriptor::new("pkg.Foo", "b");

        let mut emitter = EventEmitter::new("Suite1-smoke", &registry, &mut sender);
        emitter.run_started(&tree).expect("start");
        emitter.announce_tree(&tree).expect("tree");
        emitter.test_started(&a).expect("a start");
        emitter.test_succeeded(&a).expect("a end");
        emitter.test_started(&b).expect("b start");
        emitter
            .test_failed(&b, Some(&FailureCause::new("IllegalStateException", "x")))
            .expect("b fail");
        emitter.test_failed_within_success_percentage(&b).expect("no-op");
        emitter.run_ended(17).expect("end");

        let transcript = transcript.lock().expect("lock").clone();
        assert!(transcript.closed);
        let messages = transcript.messages().expect("decode");
        let some = |id: &str| Some(id.to_string());
        assert_eq!(
            kinds_and_ids(&messages),
            vec![
                (MessageKind::RunStarted, None),
                (MessageKind::TreeNode, some("1")),
                (MessageKind::TreeNode, some("2")),
                (MessageKind::TreeNode, some("3")),
                (MessageKind::TreeNode, some("4")),
                (MessageKind::TestStarted, some("3")),
                (MessageKind::TestEnded, some("3")),
                (MessageKind::TestStarted, some("4")),
                (MessageKind::TestError, some("4")),
                (MessageKind::TestEnded, some("4")),
                (MessageKind::RunEnded, None),
            ]
        );
        assert_eq!(messages[0].event, Event::RunStarted { total_method_count: 2 });
        assert_eq!(messages[10].event, Event::RunEnded { elapsed_millis: 17 });
        match &messages[8].event {
            Event::TestError { trace, name, .. } => {
                assert!(trace.contains("IllegalStateException"));
                assert_eq!(name, "b(pkg.Foo)");
            }
            other => panic!("expected ERROR, got {other:?}"),
        }
    }

    #[test]
    fn test_skip_is_a_flagged_pair() {
        let registry = IdRegistry::new();
        let (mut sender, transcript) = CapturingSender::new(FaultPlan::none());
        sender.init().expect("init");
        let method = MethodDescriptor::new("pkg.Foo", "a");

        EventEmitter::new("S-t", &registry, &mut sender)
            .test_skipped(&method)
            .expect("skip");

        let messages = transcript.lock().expect("lock").messages().expect("decode");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].kind(), MessageKind::TestStarted);
        assert_eq!(messages[1].kind(), MessageKind::TestEnded);
        assert!(messages.iter().all(|m| m.event.is_skipped()));
    }

    #[test]
    fn test_failure_without_cause_uses_placeholder() {
        let registry = IdRegistry::new();
        let (mut sender, transcript) = CapturingSender::new(FaultPlan::none());
        sender.init().expect("init");

        EventEmitter::new("S-t", &registry, &mut sender)
            .test_failed(&MethodDescriptor::new("pkg.Foo", "a"), None)
            .expect("fail");

        let messages = transcript.lock().expect("lock").messages().expect("decode");
        match &messages[0].event {
            Event::TestError { trace, .. } => assert_eq!(trace, MISSING_TRACE),
            other => panic!("expected ERROR, got {other:?}"),
        }
    }

    #[test]
    fn test_init_failure_is_distinguished() {
        let registry = IdRegistry::new();
        let (mut sender, _) = CapturingSender::new(FaultPlan::failing_init());
        let tree = TestTree::from_methods("t", &[] as &[MethodDescriptor]);
        let result = EventEmitter::new("S-t", &registry, &mut sender).run_started(&tree);
        assert!(matches!(result, Err(SessionError::Init(_))));
    }

    #[test]
    fn test_send_failure_is_a_transport_error() {
        let registry = IdRegistry::new();
        let (mut sender, _) = CapturingSender::new(FaultPlan::failing_send_at(1));
        let tree = TestTree::from_methods("t", &[] as &[MethodDescriptor]);
        let result = EventEmitter::new("S-t", &registry, &mut sender).run_started(&tree);
        assert!(matches!(result, Err(SessionError::Transport(_))));
    }
}
