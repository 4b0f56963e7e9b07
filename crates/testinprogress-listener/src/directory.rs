// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Execution context to session mapping
//!
//! The directory lock only guards the map and is never held while a session is
//! locked for dispatch. Callbacks of one run serialize on that run's session lock;
//! callbacks of different runs never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::SessionError;
use crate::host::ContextId;
use crate::session::{RunSession, SessionState};

/// A session shared between the threads executing one run
pub type SharedSession = Arc<Mutex<RunSession>>;

/// Registry of live sessions keyed by execution context
#[derive(Debug, Default)]
pub struct SessionDirectory {
    sessions: Mutex<HashMap<ContextId, SharedSession>>,
}

impl SessionDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<ContextId, SharedSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Session of a context, if one is live
    #[must_use]
    pub fn for_context(&self, context: ContextId) -> Option<SharedSession> {
        self.map().get(&context).cloned()
    }

    /// Register a session, returning any session it replaced
    pub fn register(&self, context: ContextId, session: RunSession) -> Option<SharedSession> {
        self.map().insert(context, Arc::new(Mutex::new(session)))
    }

    /// Forget a context
    pub fn remove(&self, context: ContextId) -> Option<SharedSession> {
        self.map().remove(&context)
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.map().len()
    }

    /// Whether no session is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    /// Run `f` against the session of `context` under that session's lock
    ///
    /// Returns `None` when the context has no live session. If the session ends up
    /// `Terminated`, it is removed before the session lock is released, so a
    /// concurrent callback waiting on the same session observes the terminated state
    /// and is ignored.
    pub fn dispatch<T, F>(&self, context: ContextId, f: F) -> Option<Result<T, SessionError>>
    where
        F: FnOnce(&mut RunSession) -> Result<T, SessionError>,
    {
        let shared = self.for_context(context)?;
        let mut session = shared.lock().unwrap_or_else(PoisonError::into_inner);
        if session.state() == SessionState::Terminated {
            return None;
        }

        let result = f(&mut *session);
        if session.state() == SessionState::Terminated {
            let mut map = self.map();
            if map
                .get(&context)
                .is_some_and(|current| Arc::ptr_eq(current, &shared))
            {
                map.remove(&context);
            }
        }
        Some(result)
    }
}
