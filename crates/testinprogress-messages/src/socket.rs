// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! TCP socket sender
//!
//! The observer listens on a TCP port; each run opens its own connection in `init`
//! and closes it in `shutdown`. The port is usually provided through the
//! `TEST_IN_PROGRESS_PORT` environment variable.

use std::io::{BufWriter, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::TransportError;
use crate::message::Message;
use crate::sender::{ChannelState, MessageSender, MessageSenderFactory};

/// Environment variable holding the observer port
pub const PORT_ENV: &str = "TEST_IN_PROGRESS_PORT";
/// Environment variable holding the observer host
pub const HOST_ENV: &str = "TEST_IN_PROGRESS_HOST";
/// Environment variable holding the connect timeout in milliseconds
pub const CONNECT_TIMEOUT_ENV: &str = "TEST_IN_PROGRESS_CONNECT_TIMEOUT_MS";
/// Host used when none is configured
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Connect timeout used when none is configured
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Where and how to connect to the observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketTarget {
    /// Observer host name or address
    pub host: String,
    /// Observer port; `None` makes every `init` fail
    pub port: Option<u16>,
    /// Maximum time spent connecting to one resolved address
    pub connect_timeout: Duration,
}

impl SocketTarget {
    /// Target a port on the default host
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: Some(port),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the host
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the connect timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Read the target from `TEST_IN_PROGRESS_*` environment variables
    ///
    /// A missing or unparsable port is kept as `None`; the failure surfaces when a
    /// sender is initialised, so a run without an observer still executes.
    #[must_use]
    pub fn from_env() -> Self {
        let port = std::env::var(PORT_ENV)
            .ok()
            .and_then(|value| value.trim().parse::<u16>().ok());
        let host = std::env::var(HOST_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let connect_timeout = std::env::var(CONNECT_TIMEOUT_ENV)
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_millis);
        Self {
            host,
            port,
            connect_timeout,
        }
    }

    fn connect(&self) -> Result<TcpStream, TransportError> {
        let port = self.port.ok_or_else(|| TransportError::Rejected {
            operation: "init",
            message: format!("no observer port configured (set {PORT_ENV})"),
        })?;

        let mut last_error = None;
        for addr in (self.host.as_str(), port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    debug!(%addr, "connected to test progress observer");
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(match last_error {
            Some(e) => TransportError::Io(e),
            None => TransportError::Rejected {
                operation: "init",
                message: format!("{}:{} did not resolve to any address", self.host, port),
            },
        })
    }
}

/// Sends newline-delimited JSON over a TCP connection
#[derive(Debug)]
pub struct SocketSender {
    target: SocketTarget,
    stream: Option<BufWriter<TcpStream>>,
    state: ChannelState,
}

impl SocketSender {
    /// Create a sender for the given target; nothing is connected until `init`
    #[must_use]
    pub fn new(target: SocketTarget) -> Self {
        Self {
            target,
            stream: None,
            state: ChannelState::Idle,
        }
    }
}

impl MessageSender for SocketSender {
    fn init(&mut self) -> Result<(), TransportError> {
        if self.state != ChannelState::Idle {
            return Err(TransportError::Closed);
        }
        let stream = self.target.connect()?;
        stream.set_nodelay(true)?;
        self.stream = Some(BufWriter::new(stream));
        self.state = ChannelState::Open;
        Ok(())
    }

    fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        self.state.ensure_open()?;
        let stream = self.stream.as_mut().ok_or(TransportError::NotInitialized)?;
        let line = message.to_json_line()?;
        stream.write_all(line.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), TransportError> {
        self.state.ensure_open()?;
        self.state = ChannelState::Closed;
        if let Some(mut stream) = self.stream.take() {
            stream.flush()?;
            stream.get_ref().shutdown(Shutdown::Both)?;
        }
        Ok(())
    }
}

/// Factory creating one [`SocketSender`] per run
#[derive(Debug, Clone)]
pub struct SocketSenderFactory {
    target: SocketTarget,
}

impl SocketSenderFactory {
    /// Create a factory for the given target
    #[must_use]
    pub fn new(target: SocketTarget) -> Self {
        Self { target }
    }

    /// Create a factory configured from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(SocketTarget::from_env())
    }

    /// The configured target
    #[must_use]
    pub fn target(&self) -> &SocketTarget {
        &self.target
    }
}

impl MessageSenderFactory for SocketSenderFactory {
    fn create_sender(&self) -> Box<dyn MessageSender> {
        Box::new(SocketSender::new(self.target.clone()))
    }
}
