// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Failure causes and their rendered traces

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a test method failed, possibly with a chain of underlying causes
///
/// Rendering follows the familiar stack trace layout:
///
/// ```text
/// IllegalStateException: x
/// 	at pkg.Foo.b(Foo.java:12)
/// Caused by: IOException: disk full
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    /// Error type name, may be empty
    pub kind: String,
    /// Error message, may be empty
    pub message: String,
    /// Frames from innermost to outermost
    #[serde(default)]
    pub frames: Vec<String>,
    /// Underlying cause
    #[serde(default)]
    pub cause: Option<Box<FailureCause>>,
}

impl FailureCause {
    /// Create a cause with a type name and message
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            frames: Vec::new(),
            cause: None,
        }
    }

    /// Append a frame
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frames.push(frame.into());
        self
    }

    /// Set the underlying cause
    #[must_use]
    pub fn caused_by(mut self, cause: FailureCause) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Build a cause from a Rust error, walking its `source()` chain
    ///
    /// The outermost cause is named after `E`; sources are anonymous.
    #[must_use]
    pub fn from_error<E: Error>(error: &E) -> Self {
        let mut sources = Vec::new();
        let mut next = error.source();
        while let Some(source) = next {
            sources.push(Self::new("", source.to_string()));
            next = source.source();
        }

        let cause = Self::new(short_type_name::<E>(), error.to_string());
        match sources
            .into_iter()
            .rev()
            .reduce(|inner, outer| outer.caused_by(inner))
        {
            Some(chain) => cause.caused_by(chain),
            None => cause,
        }
    }

    /// Full rendered trace
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    fn write_head(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind.is_empty(), self.message.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.kind, self.message),
            (false, true) => f.write_str(&self.kind),
            (true, _) => f.write_str(&self.message),
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_head(f)?;
        for frame in &self.frames {
            write!(f, "\n\tat {frame}")?;
        }
        let mut next = self.cause.as_deref();
        while let Some(cause) = next {
            f.write_str("\nCaused by: ")?;
            cause.write_head(f)?;
            for frame in &cause.frames {
                write!(f, "\n\tat {frame}")?;
            }
            next = cause.cause.as_deref();
        }
        Ok(())
    }
}

/// Last path segment of a type name, generics stripped
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
