// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for manifest validation.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Manifest validation started.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use the_arcwood::observability::messages::validation::ValidationStarted;
///
/// let msg = ValidationStarted {
///     particle_count: 5,
///     recipe_count: 2,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ValidationStarted {
    pub particle_count: usize,
    pub recipe_count: usize,
}

impl Display for ValidationStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Validating manifest with {} particles and {} recipes",
            self.particle_count, self.recipe_count
        )
    }
}

impl StructuredLog for ValidationStarted {
    fn log(&self) {
        tracing::debug!(
            particle_count = self.particle_count,
            recipe_count = self.recipe_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::DEBUG,
            "span_name",
            name = name,
            particle_count = self.particle_count,
            recipe_count = self.recipe_count,
        )
    }
}

/// A validation problem, logged as it is found.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ValidationProblem<'a> {
    pub problem: &'a dyn std::error::Error,
}

impl Display for ValidationProblem<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Manifest problem: {}", self.problem)
    }
}

impl StructuredLog for ValidationProblem<'_> {
    fn log(&self) {
        tracing::error!(problem = %self.problem, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            problem = %self.problem,
        )
    }
}

/// Manifest validation finished.
///
/// # Log Level
/// `info!` when clean, `error!` when problems were found
pub struct ValidationFinished {
    pub particle_count: usize,
    pub error_count: usize,
}

impl Display for ValidationFinished {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.error_count > 0 {
            write!(
                f,
                "Manifest validation failed with {} errors",
                self.error_count
            )
        } else {
            write!(
                f,
                "Manifest validated: {} particles available",
                self.particle_count
            )
        }
    }
}

impl StructuredLog for ValidationFinished {
    fn log(&self) {
        if self.error_count > 0 {
            tracing::error!(error_count = self.error_count, "{}", self);
        } else {
            tracing::info!(particle_count = self.particle_count, "{}", self);
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            particle_count = self.particle_count,
            error_count = self.error_count,
        )
    }
}
