// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for recipe search and speculative evaluation.

use crate::errors::{ChannelError, ContextError};
use thiserror::Error;

/// Failure of one speculative run. Fatal to that candidate only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpeculationError {
    #[error("instantiation failed: {0}")]
    Instantiation(#[from] ContextError),

    #[error("speculative context failed: {0}")]
    Channel(#[from] ChannelError),

    /// The speculative context kept producing traffic past the settle round cap.
    #[error("context did not settle within {rounds} rounds")]
    NeverSettled { rounds: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    #[error("strategy '{strategy}' failed: {reason}")]
    Strategy {
        strategy: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Context(#[from] ContextError),
}
