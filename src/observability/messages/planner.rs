// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for recipe search and suggestion filtering.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// One strategy ran against the previous generation.
///
/// # Log Level
/// `trace!` - One per strategy per generation
pub struct StrategyApplied<'a> {
    pub strategy: &'a str,
    pub generation: usize,
    pub descendants: usize,
}

impl Display for StrategyApplied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} proposed {} descendants in generation {}",
            self.strategy, self.descendants, self.generation
        )
    }
}

impl StructuredLog for StrategyApplied<'_> {
    fn log(&self) {
        tracing::trace!(
            strategy = self.strategy,
            generation = self.generation,
            descendants = self.descendants,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("strategy", span_name = name, strategy = self.strategy)
    }
}

/// A search step finished.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct GenerationCompleted {
    pub generation: usize,
    pub generated: usize,
    pub duplicates: usize,
    pub population: usize,
    pub duration: Duration,
}

impl Display for GenerationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Generation {} produced {} new candidates ({} duplicates) in {:?}, population {}",
            self.generation, self.generated, self.duplicates, self.duration, self.population
        )
    }
}

impl StructuredLog for GenerationCompleted {
    fn log(&self) {
        tracing::debug!(
            generation = self.generation,
            generated = self.generated,
            duplicates = self.duplicates,
            population = self.population,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("generation", span_name = name, generation = self.generation)
    }
}

/// The planning window closed before the search ran dry.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
pub struct PlanningTimedOut {
    pub elapsed: Duration,
    pub generation: usize,
    pub resolved: usize,
}

impl Display for PlanningTimedOut {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Planning timed out after {:?} at generation {} with {} resolved plans",
            self.elapsed, self.generation, self.resolved
        )
    }
}

impl StructuredLog for PlanningTimedOut {
    fn log(&self) {
        tracing::warn!(
            elapsed_ms = self.elapsed.as_millis() as u64,
            generation = self.generation,
            resolved = self.resolved,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("planning_timeout", span_name = name, generation = self.generation)
    }
}

/// Planning finished.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_arcwood::observability::messages::planner::PlanningCompleted;
/// use std::time::Duration;
///
/// let msg = PlanningCompleted {
///     generations: 3,
///     resolved: 4,
///     duration: Duration::from_millis(12),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PlanningCompleted {
    pub generations: usize,
    pub resolved: usize,
    pub duration: Duration,
}

impl Display for PlanningCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Planning produced {} resolved plans over {} generations in {:?}",
            self.resolved, self.generations, self.duration
        )
    }
}

impl StructuredLog for PlanningCompleted {
    fn log(&self) {
        tracing::info!(
            generations = self.generations,
            resolved = self.resolved,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("planning", span_name = name, generations = self.generations)
    }
}

/// Why a resolved plan did not become a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The plan's shape is already running in the context.
    Active,
    /// Speculation scored it as irrelevant.
    Irrelevant,
    /// The description does not mention the search text.
    SearchMismatch,
    /// The same digest was already suggested.
    Duplicate,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let reason = match self {
            SkipReason::Active => "already active",
            SkipReason::Irrelevant => "irrelevant",
            SkipReason::SearchMismatch => "does not match search",
            SkipReason::Duplicate => "duplicate",
        };
        write!(f, "{}", reason)
    }
}

/// A resolved plan was filtered out of the suggestions.
///
/// # Log Level
/// `debug!` - Normal filtering outcome
pub struct PlanSkipped<'a> {
    pub hash: &'a str,
    pub reason: SkipReason,
}

impl Display for PlanSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Skipping plan {}: {}", self.hash, self.reason)
    }
}

impl StructuredLog for PlanSkipped<'_> {
    fn log(&self) {
        tracing::debug!(hash = self.hash, reason = %self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("skipped", span_name = name, hash = self.hash)
    }
}

/// Suggestion pass finished.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SuggestionsCompleted {
    pub plans: usize,
    pub suggestions: usize,
}

impl Display for SuggestionsCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} of {} resolved plans became suggestions",
            self.suggestions, self.plans
        )
    }
}

impl StructuredLog for SuggestionsCompleted {
    fn log(&self) {
        tracing::info!(
            plans = self.plans,
            suggestions = self.suggestions,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("suggest", span_name = name, plans = self.plans)
    }
}

/// A permuted walk hit its descendant cap; later combinations were dropped.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct PermutationsTruncated {
    pub limit: usize,
    pub alternatives: usize,
}

impl Display for PermutationsTruncated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Permuted walk truncated at {} descendants while applying {} alternatives",
            self.limit, self.alternatives
        )
    }
}

impl StructuredLog for PermutationsTruncated {
    fn log(&self) {
        tracing::debug!(
            limit = self.limit,
            alternatives = self.alternatives,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("permutations", span_name = name, limit = self.limit)
    }
}
