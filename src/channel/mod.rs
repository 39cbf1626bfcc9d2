// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Point-to-point message channel between a controller and an isolated
//! execution context.
//!
//! Layers, leaves first:
//! * [`mapper`] - per-endpoint identifier tables
//! * [`converter`] and [`value`] - argument marshaling
//! * [`transport`] - JSON text over tokio channels
//! * [`port`] - typed call/handler registration and the serve loop
//! * [`protocol`] - the mirrored execution context message set

pub mod converter;
pub mod mapper;
pub mod port;
pub mod protocol;
pub mod transport;
pub mod value;


use std::fmt::Debug;
use std::hash::Hash;

pub use converter::Converter;
pub use mapper::{ReferenceMapper, Resolution};
pub use port::{schema, ApiPort, MessageHandler, Outcome, Schema};
pub use transport::{Envelope, MessageChannel, Transport};
pub use value::{Args, Value};

/// Anything that can stand behind a channel identifier.
pub trait Thing: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Thing for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}
