// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution contexts: view data, the controller/inner channel pair, particle
//! hosting and the cooperative scheduler.

pub mod context;
pub mod host;
pub mod inner;
pub mod scheduler;
pub mod store;

pub use context::{Context, IdleReport};
pub use host::{ParticleHost, ViewHandle};
pub use inner::InnerContext;
pub use scheduler::{Scheduler, ViewListener};
pub use store::{StoredView, ViewChange, ViewEvent, ViewStore};
