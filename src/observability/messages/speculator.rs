// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for speculative runs.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A speculative run is starting in a cloned context.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct SpeculationStarted<'a> {
    pub context: &'a str,
    pub hash: &'a str,
}

impl Display for SpeculationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Speculating plan {} in {}", self.hash, self.context)
    }
}

impl StructuredLog for SpeculationStarted<'_> {
    fn log(&self) {
        tracing::debug!(context = self.context, hash = self.hash, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "speculation",
            span_name = name,
            context = self.context,
            hash = self.hash,
        )
    }
}

/// The speculative context went quiet.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct SpeculationSettled<'a> {
    pub hash: &'a str,
    pub rounds: usize,
    pub score: f64,
}

impl Display for SpeculationSettled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Plan {} settled after {} rounds with relevance {:.3}",
            self.hash, self.rounds, self.score
        )
    }
}

impl StructuredLog for SpeculationSettled<'_> {
    fn log(&self) {
        tracing::debug!(
            hash = self.hash,
            rounds = self.rounds,
            score = self.score,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("settled", span_name = name, hash = self.hash)
    }
}

/// A speculative run failed; the candidate is dropped.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
///
/// # Example
/// ```
/// use the_arcwood::observability::messages::speculator::SpeculationFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "particle exploded");
/// let msg = SpeculationFailed {
///     hash: "9c0d",
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct SpeculationFailed<'a> {
    pub hash: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for SpeculationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Dropping plan {}: {}", self.hash, self.error)
    }
}

impl StructuredLog for SpeculationFailed<'_> {
    fn log(&self) {
        tracing::warn!(hash = self.hash, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("speculation_failed", span_name = name, hash = self.hash)
    }
}
