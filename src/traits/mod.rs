// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod particle;
pub mod strategy;

pub use particle::{Particle, ParticleFactory};
pub use strategy::{Strategy, StrategyInput};
