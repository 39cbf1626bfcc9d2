// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for execution contexts.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A plan was instantiated into a context.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use the_arcwood::observability::messages::context::PlanInstantiated;
///
/// let msg = PlanInstantiated {
///     context: "demo",
///     particle_count: 2,
///     view_count: 3,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct PlanInstantiated<'a> {
    pub context: &'a str,
    pub particle_count: usize,
    pub view_count: usize,
}

impl Display for PlanInstantiated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Context {} instantiated plan with {} particles over {} views",
            self.context, self.particle_count, self.view_count
        )
    }
}

impl StructuredLog for PlanInstantiated<'_> {
    fn log(&self) {
        tracing::debug!(
            context = self.context,
            particle_count = self.particle_count,
            view_count = self.view_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "instantiate",
            span_name = name,
            context = self.context,
            particle_count = self.particle_count,
        )
    }
}

/// A context was stopped.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct ContextStopped<'a> {
    pub context: &'a str,
    pub message_count: u64,
}

impl Display for ContextStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Context {} stopped after {} inbound messages",
            self.context, self.message_count
        )
    }
}

impl StructuredLog for ContextStopped<'_> {
    fn log(&self) {
        tracing::debug!(
            context = self.context,
            message_count = self.message_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("context", span_name = name, context = self.context)
    }
}

/// A particle rendered content into a slot.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct SlotRendered<'a> {
    pub context: &'a str,
    pub particle: &'a str,
    pub slot: &'a str,
}

impl Display for SlotRendered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} rendered into slot '{}' of {}",
            self.particle, self.slot, self.context
        )
    }
}

impl StructuredLog for SlotRendered<'_> {
    fn log(&self) {
        tracing::debug!(
            context = self.context,
            particle = self.particle,
            slot = self.slot,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "render",
            span_name = name,
            particle = self.particle,
            slot = self.slot,
        )
    }
}

/// A particle was told to stop rendering into a slot.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct RenderStopped<'a> {
    pub context: &'a str,
    pub particle: &'a str,
    pub slot: &'a str,
}

impl Display for RenderStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} stopped rendering into slot '{}' of {}",
            self.particle, self.slot, self.context
        )
    }
}

impl StructuredLog for RenderStopped<'_> {
    fn log(&self) {
        tracing::debug!(
            context = self.context,
            particle = self.particle,
            slot = self.slot,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stop_render",
            span_name = name,
            particle = self.particle,
            slot = self.slot,
        )
    }
}
