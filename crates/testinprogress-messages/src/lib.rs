// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! testinprogress-messages: Wire messages and message senders for testinprogress
//!
//! This library crate defines the newline-delimited JSON records streamed to a test
//! progress observer, the [`MessageSender`] capability every transport implements,
//! and tools to decode and validate recorded streams.
//!
//! # Example
//!
//! ```no_run
//! use testinprogress_messages::{Event, Message, MessageSender, SocketSender, SocketTarget};
//!
//! let mut sender = SocketSender::new(SocketTarget::from_env());
//! sender.init().expect("connect");
//! sender
//!     .send(&Message::new("Suite1-smoke", Event::RunStarted { total_method_count: 0 }))
//!     .expect("send");
//! sender.shutdown().expect("close");
//! ```

#![warn(missing_docs)]

pub mod capture;
pub mod error;
pub mod message;
pub mod sender;
pub mod socket;
pub mod stream;

pub use capture::{CapturingSender, CapturingSenderFactory, FaultPlan, Transcript};
pub use error::{MessagesError, TransportError};
pub use message::{Event, Message, MessageKind};
pub use sender::{ChannelState, MessageSender, MessageSenderFactory, StdoutSenderFactory, WriterSender};
pub use socket::{SocketSender, SocketSenderFactory, SocketTarget};
pub use stream::{RunStreamSummary, StreamValidator, parse_line, parse_stream, validate_stream};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{MessagesError, TransportError};
    pub use crate::message::{Event, Message, MessageKind};
    pub use crate::sender::{MessageSender, MessageSenderFactory};
}
