// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit that line with structured fields at the level the
//! message documents.
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_arcwood::observability::messages::StructuredLog;
//! use the_arcwood::observability::messages::speculator::SpeculationStarted;
//!
//! let msg = SpeculationStarted {
//!     context: "ctx-speculative0",
//!     hash: "3f2a",
//! };
//!
//! msg.log();
//! let _span = msg.span("speculate");
//! ```

pub mod channel;
pub mod context;
pub mod planner;
pub mod speculator;
pub mod validation;

use tracing::Span;

/// A message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message at its documented level.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
