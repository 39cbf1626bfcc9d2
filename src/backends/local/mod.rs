// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod factory;
pub mod particles;

pub use factory::LocalParticleFactory;
pub use particles::*;
