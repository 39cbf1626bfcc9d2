// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Particle backends.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process Rust particles for text manipulation and analysis:
//! - **Text Transformation**: Case conversion, reversal
//! - **Text Analysis**: Token counting
//! - **Presentation**: Rendering text into a slot
//!
//! ## Stub Backend (Test-Only)
//! Test doubles for context and planner tests (only available in test builds):
//! - **StubParticle**: Does nothing, reports relevance 1.0
//! - **FailingParticle**: Setup fails, for speculation failure handling
//! - **IrrelevantParticle**: Reports negative relevance
//!
//! # Architecture
//!
//! Backends are selected by implementation name on the inner side of an
//! execution context:
//! ```text
//! ParticleSpec.implementation → ParticleFactory → Particle → ParticleHost
//! ```
//!
//! # Examples
//!
//! ```rust
//! use the_arcwood::backends::local::LocalParticleFactory;
//! use the_arcwood::traits::{Particle, ParticleFactory};
//!
//! let particle = LocalParticleFactory.create_particle("change_text_case_upper")?;
//! assert_eq!(particle.name(), "change_text_case");
//! # Ok::<(), String>(())
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
