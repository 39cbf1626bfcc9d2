// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic the crate emits is a message struct with a `Display`
//! implementation and a [`messages::StructuredLog`] implementation that knows its
//! own level and fields. Call sites build the struct and call `.log()`.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::channel` - port dispatch, deferral and protocol violations
//! * `messages::context` - plan instantiation and execution context lifecycle
//! * `messages::planner` - recipe search generations and suggestion filtering
//! * `messages::speculator` - speculative runs
//! * `messages::validation` - manifest validation problems
//!
//! # Usage
//!
//! ```rust
//! use the_arcwood::observability::messages::planner::PlanningTimedOut;
//! use std::time::Duration;
//!
//! let msg = PlanningTimedOut {
//!     elapsed: Duration::from_millis(250),
//!     generation: 4,
//!     resolved: 2,
//! };
//!
//! tracing::warn!("{}", msg);
//! ```

pub mod messages;
