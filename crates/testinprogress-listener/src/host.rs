// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Host test-engine abstractions
//!
//! The listener never drives tests itself. The host engine hands it a [`RunContext`]
//! when a run starts or finishes and a [`TestInvocation`] for every method callback,
//! through the [`TestListener`] surface.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::failure::FailureCause;

/// Sub-test name used when the host reports none
pub const DEFAULT_TEST_NAME: &str = "Testng xml test";

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one executing run, as seen by the host engine
///
/// Two runs sharing a suite and sub-test name still get distinct context ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Wrap a host-provided identity
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Allocate a process-unique identity
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// A test method as declared by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Fully qualified declaring class
    pub class_name: String,
    /// Method name, without parameters
    pub method_name: String,
}

impl MethodDescriptor {
    /// Describe a method of a class
    #[must_use]
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
        }
    }

    /// Name shown to the observer, `method(class)`
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}({})", self.method_name, self.class_name)
    }
}

/// Build the run key `suite-subtest`, substituting [`DEFAULT_TEST_NAME`] for a
/// missing or empty sub-test name
#[must_use]
pub fn run_key(suite_name: &str, test_name: Option<&str>) -> String {
    format!("{}-{}", suite_name, run_display_name(test_name))
}

/// Sub-test name with the default applied
#[must_use]
pub fn run_display_name(test_name: Option<&str>) -> &str {
    match test_name {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_TEST_NAME,
    }
}

/// What the host knows about one run
pub trait RunContext: Send + Sync {
    /// Identity used to route callbacks to this run's session
    fn context_id(&self) -> ContextId;

    /// Suite the run belongs to
    fn suite_name(&self) -> &str;

    /// Sub-test name, if the host named it
    fn test_name(&self) -> Option<&str>;

    /// When the run started
    fn start_time(&self) -> DateTime<Utc>;

    /// When the run finished, once known
    fn end_time(&self) -> Option<DateTime<Utc>>;

    /// Every method the host intends to run, data-driven methods possibly repeated
    fn test_methods(&self) -> &[MethodDescriptor];

    /// Run key derived from the suite and sub-test names
    fn run_key(&self) -> String {
        run_key(self.suite_name(), self.test_name())
    }

    /// Milliseconds between start and end; the current time stands in for a
    /// missing end time
    fn elapsed_millis(&self) -> i64 {
        let end = self.end_time().unwrap_or_else(Utc::now);
        (end - self.start_time()).num_milliseconds()
    }
}

/// One callback-worthy execution of a test method
pub trait TestInvocation: Send + Sync {
    /// Run the method belongs to
    fn context(&self) -> &dyn RunContext;

    /// Method being reported
    fn method(&self) -> &MethodDescriptor;

    /// Failure cause, for failed invocations
    fn failure(&self) -> Option<&FailureCause>;
}

/// Lifecycle callbacks a host engine invokes
///
/// Implementations must never panic or return errors to the host: reporting is
/// best-effort and must not change the outcome of the run.
pub trait TestListener: Send + Sync {
    /// A run is about to execute its methods
    fn on_run_start(&self, context: &dyn RunContext);

    /// A run has finished
    fn on_run_finish(&self, context: &dyn RunContext);

    /// A method started
    fn on_test_start(&self, result: &dyn TestInvocation);

    /// A method passed
    fn on_test_success(&self, result: &dyn TestInvocation);

    /// A method failed
    fn on_test_failure(&self, result: &dyn TestInvocation);

    /// A method was skipped
    fn on_test_skipped(&self, result: &dyn TestInvocation);

    /// A method failed but stayed within its success percentage
    fn on_test_failed_within_success_percentage(&self, result: &dyn TestInvocation);
}

/// Owned [`RunContext`] for hosts that do not have their own context type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDescriptor {
    /// Routing identity
    pub id: ContextId,
    /// Suite name
    pub suite_name: String,
    /// Sub-test name
    pub test_name: Option<String>,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time, set when the run finishes
    pub finished_at: Option<DateTime<Utc>>,
    /// Declared methods in discovery order
    pub methods: Vec<MethodDescriptor>,
}

impl RunDescriptor {
    /// Describe a run starting now, with a fresh context id
    #[must_use]
    pub fn new(suite_name: impl Into<String>, test_name: Option<&str>) -> Self {
        Self {
            id: ContextId::next(),
            suite_name: suite_name.into(),
            test_name: test_name.map(str::to_string),
            started_at: Utc::now(),
            finished_at: None,
            methods: Vec::new(),
        }
    }

    /// Declare a method
    #[must_use]
    pub fn with_method(mut self, class_name: &str, method_name: &str) -> Self {
        self.methods
            .push(MethodDescriptor::new(class_name, method_name));
        self
    }

    /// Override the start time
    #[must_use]
    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = at;
        self
    }

    /// Record the end time
    pub fn finish_at(&mut self, at: DateTime<Utc>) {
        self.finished_at = Some(at);
    }

    /// Report an invocation of a declared (or undeclared) method of this run
    #[must_use]
    pub fn invocation(&self, class_name: &str, method_name: &str) -> InvocationReport<'_> {
        InvocationReport::new(self, MethodDescriptor::new(class_name, method_name))
    }
}

impl RunContext for RunDescriptor {
    fn context_id(&self) -> ContextId {
        self.id
    }

    fn suite_name(&self) -> &str {
        &self.suite_name
    }

    fn test_name(&self) -> Option<&str> {
        self.test_name.as_deref()
    }

    fn start_time(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn end_time(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    fn test_methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }
}

/// Borrowed [`TestInvocation`] over any run context
#[derive(Clone)]
pub struct InvocationReport<'a> {
    context: &'a dyn RunContext,
    method: MethodDescriptor,
    failure: Option<FailureCause>,
}

impl<'a> InvocationReport<'a> {
    /// Report a method of the given run
    #[must_use]
    pub fn new(context: &'a dyn RunContext, method: MethodDescriptor) -> Self {
        Self {
            context,
            method,
            failure: None,
        }
    }

    /// Attach the cause of a failure
    #[must_use]
    pub fn with_failure(mut self, failure: FailureCause) -> Self {
        self.failure = Some(failure);
        self
    }
}

impl std::fmt::Debug for InvocationReport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationReport")
            .field("context", &self.context.context_id())
            .field("method", &self.method)
            .field("failure", &self.failure)
            .finish()
    }
}

impl TestInvocation for InvocationReport<'_> {
    fn context(&self) -> &dyn RunContext {
        self.context
    }

    fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    fn failure(&self) -> Option<&FailureCause> {
        self.failure.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use similar_asserts::assert_eq;

    #[test]
    fn test_run_key_uses_default_for_missing_test_name() {
        assert_eq!(run_key("Suite1", Some("")), "Suite1-Testng xml test");
        assert_eq!(run_key("Suite1", None), "Suite1-Testng xml test");
        assert_eq!(run_key("TestAll", Some("order")), "TestAll-order");
    }

    #[test]
    fn test_display_name() {
        let method = MethodDescriptor::new("pkg.Foo", "a");
        assert_eq!(method.display_name(), "a(pkg.Foo)");
    }

    #[test]
    fn test_context_ids_are_unique() {
        let a = ContextId::next();
        let b = ContextId::next();
        assert!(a != b);
        assert_eq!(ContextId::new(7).get(), 7);
        assert_eq!(ContextId::new(7).to_string(), "ctx-7");
    }

    #[test]
    fn test_elapsed_millis_from_timestamps() {
        let start = Utc.with_ymd_and_hms(2026, 1, 17, 2, 33, 6).unwrap();
        let mut run = RunDescriptor::new("Suite1", Some("smoke")).started_at(start);
        run.finish_at(start + Duration::milliseconds(1250));
        assert_eq!(run.elapsed_millis(), 1250);
        assert_eq!(run.run_key(), "Suite1-smoke");
    }

    #[test]
    fn test_invocation_report() {
        let run = RunDescriptor::new("Suite1", None).with_method("pkg.Foo", "a");
        let report = run
            .invocation("pkg.Foo", "a")
            .with_failure(FailureCause::new("IllegalStateException", "x"));
        assert_eq!(report.context().context_id(), run.id);
        assert_eq!(report.method().display_name(), "a(pkg.Foo)");
        assert!(report.failure().is_some());
        assert_eq!(run.test_methods().len(), 1);
    }
}
