// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod channel;
mod config;
mod context;
mod planning;

pub use channel::ChannelError;
pub use config::{ConfigError, ValidationError};
pub use context::{ContextError, ParticleError};
pub use planning::{PlanningError, SpeculationError};
