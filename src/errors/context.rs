// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for execution contexts and the particles hosted inside them.

use crate::errors::ChannelError;
use thiserror::Error;

/// Errors from instantiating plans into an execution context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    /// Only fully resolved recipes can be instantiated.
    #[error("recipe {0} is not resolved")]
    UnresolvedPlan(String),

    #[error("unknown view '{0}'")]
    UnknownView(String),

    #[error("particle '{0}' has no spec")]
    MissingSpec(String),

    /// The particle names an implementation the registry does not provide.
    #[error("particle '{particle}' requires unknown implementation '{implementation}'")]
    MissingImplementation {
        particle: String,
        implementation: String,
    },

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Errors a particle can hit while talking to its host.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParticleError {
    #[error("particle has no connection named '{0}'")]
    UnknownConnection(String),

    #[error("connection '{0}' is not readable")]
    NotReadable(String),

    #[error("connection '{0}' is not writable")]
    NotWritable(String),

    /// The reply to a view read never arrived because the context went away.
    #[error("execution context disconnected")]
    Disconnected,

    #[error("particle failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}
