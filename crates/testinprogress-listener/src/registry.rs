// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Identifier registry
//!
//! Hands out short sequential identifiers (`"1"`, `"2"`, ...) for composite keys and
//! remembers them for the lifetime of a run.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::host::MethodDescriptor;

/// Composite key of a class node
#[must_use]
pub fn class_key(run_key: &str, class_name: &str) -> String {
    format!("{run_key}:{class_name}")
}

/// Composite key of a method node, shared by every invocation of the method
#[must_use]
pub fn method_key(run_key: &str, method: &MethodDescriptor) -> String {
    format!("{run_key}:{}", method.display_name())
}

#[derive(Debug)]
struct RegistryState {
    ids: HashMap<String, String>,
    next_id: u64,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            ids: HashMap::new(),
            next_id: 1,
        }
    }
}

/// Memoizing identifier allocator, safe to share between threads
#[derive(Debug, Default)]
pub struct IdRegistry {
    state: Mutex<RegistryState>,
}

impl IdRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier for `key`, allocating the next one on first use
    pub fn resolve(&self, key: &str) -> String {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = state.ids.get(key) {
            return id.clone();
        }
        let id = state.next_id.to_string();
        state.next_id += 1;
        state.ids.insert(key.to_string(), id.clone());
        id
    }

    /// Number of identifiers allocated so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ids
            .len()
    }

    /// Whether nothing has been allocated yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
