// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Configuration for the testinprogress command line
//!
//! This module provides the command-line configuration, including the observer
//! endpoint, logging options, and the replay and verify subcommands.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use testinprogress_messages::SocketTarget;
use testinprogress_messages::socket::{CONNECT_TIMEOUT_ENV, DEFAULT_HOST, HOST_ENV, PORT_ENV};

/// Connect timeout, in milliseconds, used when none is configured
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// testinprogress - stream live test progress to an observer
#[derive(Parser, Debug, Clone)]
#[command(name = "testinprogress")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Host of the progress observer
    #[arg(long, env = HOST_ENV, default_value = DEFAULT_HOST)]
    pub host: String,

    /// TCP port the progress observer listens on
    ///
    /// Required unless messages are written to stdout.
    #[arg(short, long, env = PORT_ENV)]
    pub port: Option<u16>,

    /// Maximum time spent connecting to the observer, in milliseconds
    #[arg(long, env = CONNECT_TIMEOUT_ENV, default_value_t = DEFAULT_CONNECT_TIMEOUT_MS)]
    pub connect_timeout_ms: u64,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so they never mix with messages on stdout.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replay a recorded test plan through the progress listener
    ///
    /// Example:
    ///   TEST_IN_PROGRESS_PORT=51000 testinprogress replay plan.json
    Replay {
        /// JSON plan describing the runs and their method outcomes
        plan: PathBuf,

        /// Write messages to stdout instead of the observer socket
        #[arg(long)]
        stdout: bool,

        /// Execute runs concurrently, one thread per run
        #[arg(long)]
        parallel: bool,
    },

    /// Check a recorded message stream against the protocol ordering rules
    Verify {
        /// Newline-delimited JSON stream, `-` for stdin
        stream: PathBuf,
    },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: None,
            host: DEFAULT_HOST.to_string(),
            port: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            verbose: false,
            quiet: false,
        }
    }
}

impl Config {
    /// Observer endpoint, if a port is configured
    #[must_use]
    pub fn socket_target(&self) -> Option<SocketTarget> {
        self.port.map(|port| {
            SocketTarget::new(port)
                .with_host(self.host.as_str())
                .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms))
        })
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An input file does not exist
    /// - A replay needs the observer socket but no port is configured
    /// - The observer host is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.command {
            Some(Command::Replay { plan, stdout, .. }) => {
                if !plan.is_file() {
                    return Err(ConfigError::InputNotFound(plan.clone()));
                }
                if !stdout {
                    if self.port.is_none() {
                        return Err(ConfigError::MissingPort);
                    }
                    if self.host.trim().is_empty() {
                        return Err(ConfigError::EmptyHost);
                    }
                }
            }
            Some(Command::Verify { stream }) => {
                if stream.as_os_str() != "-" && !stream.is_file() {
                    return Err(ConfigError::InputNotFound(stream.clone()));
                }
            }
            None => {}
        }
        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Input file not found
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// No observer port configured
    #[error("No observer port configured: pass --port or set {PORT_ENV}")]
    MissingPort,

    /// Observer host is empty
    #[error("Observer host is empty")]
    EmptyHost,
}
