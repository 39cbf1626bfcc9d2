// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for port dispatch and protocol failures.

use crate::errors::ChannelError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An inbound message was decoded and handed to the handler.
///
/// # Log Level
/// `trace!` - One per message
pub struct MessageDispatched<'a> {
    pub port: &'a str,
    pub message_type: &'a str,
    pub message_count: u64,
}

impl Display for MessageDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} dispatching {} (#{})",
            self.port, self.message_type, self.message_count
        )
    }
}

impl StructuredLog for MessageDispatched<'_> {
    fn log(&self) {
        tracing::trace!(
            port = self.port,
            message_type = self.message_type,
            message_count = self.message_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "dispatch",
            span_name = name,
            port = self.port,
            message_type = self.message_type,
        )
    }
}

/// An inbound message refers to a pending identifier and was parked.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use the_arcwood::observability::messages::channel::MessageDeferred;
///
/// let msg = MessageDeferred {
///     port: "ctx/inner",
///     message_type: "StartRender",
///     identifier: "o3",
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct MessageDeferred<'a> {
    pub port: &'a str,
    pub message_type: &'a str,
    pub identifier: &'a str,
}

impl Display for MessageDeferred<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} deferring {} until '{}' settles",
            self.port, self.message_type, self.identifier
        )
    }
}

impl StructuredLog for MessageDeferred<'_> {
    fn log(&self) {
        tracing::debug!(
            port = self.port,
            message_type = self.message_type,
            identifier = self.identifier,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "deferred",
            span_name = name,
            port = self.port,
            identifier = self.identifier,
        )
    }
}

/// A serve loop ended on a protocol violation. The context tears down.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ProtocolViolation<'a> {
    pub port: &'a str,
    pub error: &'a ChannelError,
}

impl Display for ProtocolViolation<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} stopped on protocol violation: {}", self.port, self.error)
    }
}

impl StructuredLog for ProtocolViolation<'_> {
    fn log(&self) {
        tracing::error!(port = self.port, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("protocol", span_name = name, port = self.port)
    }
}

/// A serve loop ended normally.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct PortClosed<'a> {
    pub port: &'a str,
    pub message_count: u64,
}

impl Display for PortClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} closed after {} messages",
            self.port, self.message_count
        )
    }
}

impl StructuredLog for PortClosed<'_> {
    fn log(&self) {
        tracing::debug!(
            port = self.port,
            message_count = self.message_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("port", span_name = name, port = self.port)
    }
}
