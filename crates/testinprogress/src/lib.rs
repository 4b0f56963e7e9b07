// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! testinprogress library
//!
//! This module exports the configuration, replay and verification logic of the
//! testinprogress command for use in integration tests and as a library.

pub mod config;
pub mod replay;
pub mod verify;

use std::sync::Arc;

use testinprogress_listener::ProgressListener;
use testinprogress_messages::{MessageSenderFactory, SocketSenderFactory, StdoutSenderFactory};

use config::ConfigError;

/// Sender factory selected by the configuration
///
/// # Errors
///
/// Returns `ConfigError::MissingPort` when the socket backend is needed but no port
/// is configured.
pub fn sender_factory(
    config: &config::Config,
    stdout: bool,
) -> Result<Arc<dyn MessageSenderFactory>, ConfigError> {
    if stdout {
        return Ok(Arc::new(StdoutSenderFactory));
    }
    let target = config.socket_target().ok_or(ConfigError::MissingPort)?;
    Ok(Arc::new(SocketSenderFactory::new(target)))
}

/// Listener writing through the configured backend
///
/// # Errors
///
/// See [`sender_factory`].
pub fn listener(config: &config::Config, stdout: bool) -> Result<ProgressListener, ConfigError> {
    Ok(ProgressListener::new(sender_factory(config, stdout)?))
}
