// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by the reference mapper and the message channel.
//!
//! Every variant is a protocol violation: the serve loop that hits one stops and
//! the owning execution context tears down. Nothing here is retried.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// A fresh mapping was requested for a thing that already has an identifier.
    #[error("{thing} is already mapped to '{identifier}'")]
    AlreadyMapped { thing: String, identifier: String },

    /// An identifier was established twice.
    #[error("identifier '{0}' is already established")]
    DuplicateIdentifier(String),

    /// Reverse lookup for a thing that was never mapped.
    #[error("no identifier for {0}")]
    MissingThing(String),

    /// Forward lookup for an identifier this side has never seen.
    #[error("missing id: {0}")]
    MissingIdentifier(String),

    /// `settle` was called for an identifier that is not a pending placeholder.
    #[error("identifier '{0}' is not pending")]
    NotPending(String),

    #[error("unknown message type '{0}'")]
    UnknownMessage(String),

    /// The message type exists but was registered with a different kind.
    #[error("message type '{message_type}' is not registered as {expected}")]
    WrongKind {
        message_type: String,
        expected: &'static str,
    },

    #[error("missing argument '{0}'")]
    MissingArgument(String),

    #[error("argument '{argument}' could not be converted: {reason}")]
    Conversion { argument: String, reason: String },

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("channel '{0}' is closed")]
    Closed(String),

    #[error("handler for '{message_type}' failed: {reason}")]
    HandlerFailed {
        message_type: String,
        reason: String,
    },
}

impl ChannelError {
    pub(crate) fn conversion(argument: &str, reason: impl ToString) -> Self {
        ChannelError::Conversion {
            argument: argument.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn handler_failed(message_type: &str, reason: impl ToString) -> Self {
        ChannelError::HandlerFailed {
            message_type: message_type.to_string(),
            reason: reason.to_string(),
        }
    }
}
