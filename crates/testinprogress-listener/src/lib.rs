// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! testinprogress-listener: Live test progress reporting for test engines
//!
//! This library crate turns the lifecycle callbacks of a host test engine into the
//! testinprogress wire protocol. Each run gets its own session with a private
//! identifier space and message sender; transport failures are logged and contained
//! so they never affect test outcomes.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use testinprogress_listener::{ProgressListener, RunDescriptor, TestListener};
//! use testinprogress_messages::CapturingSenderFactory;
//!
//! let factory = Arc::new(CapturingSenderFactory::new());
//! let listener = ProgressListener::new(factory.clone());
//!
//! let run = RunDescriptor::new("Suite1", Some("smoke")).with_method("pkg.FooTest", "adds");
//! listener.on_run_start(&run);
//! let invocation = run.invocation("pkg.FooTest", "adds");
//! listener.on_test_start(&invocation);
//! listener.on_test_success(&invocation);
//! listener.on_run_finish(&run);
//!
//! assert_eq!(factory.transcripts()[0].lines.len(), 7);
//! ```

#![warn(missing_docs)]

pub mod directory;
pub mod emitter;
pub mod error;
pub mod failure;
pub mod host;
pub mod listener;
pub mod registry;
pub mod session;
pub mod tree;

pub use directory::{SessionDirectory, SharedSession};
pub use emitter::{EventEmitter, MISSING_TRACE};
pub use error::SessionError;
pub use failure::FailureCause;
pub use host::{
    ContextId, DEFAULT_TEST_NAME, InvocationReport, MethodDescriptor, RunContext, RunDescriptor,
    TestInvocation, TestListener, run_key,
};
pub use listener::ProgressListener;
pub use registry::IdRegistry;
pub use session::{Lifecycle, RunSession, SessionState};
pub use tree::{ClassGroup, TestTree, TreeNode};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::failure::FailureCause;
    pub use crate::host::{MethodDescriptor, RunContext, RunDescriptor, TestInvocation, TestListener};
    pub use crate::listener::ProgressListener;
}
