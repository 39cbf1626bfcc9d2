// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::ParticleError;
use crate::runtime::host::ParticleHost;

#[async_trait]
pub trait Particle: Send + Sync {
    /// Runs once when the particle is instantiated. The particle's identifier
    /// stays pending until this returns.
    async fn setup(&self, host: &ParticleHost) -> Result<(), ParticleError>;

    async fn render(&self, _host: &ParticleHost, _slot_name: &str) -> Result<(), ParticleError> {
        Ok(())
    }

    /// The slot no longer shows this particle's content.
    async fn stop_render(&self, _host: &ParticleHost, _slot_name: &str) -> Result<(), ParticleError> {
        Ok(())
    }

    fn name(&self) -> &'static str;
}

/// Builds particles by implementation name on the execution context side.
pub trait ParticleFactory: Send + Sync {
    fn create_particle(&self, implementation: &str) -> Result<Arc<dyn Particle>, String>;

    fn list_available_implementations(&self) -> Vec<&'static str>;

    fn is_implementation_available(&self, implementation: &str) -> bool {
        self.list_available_implementations().contains(&implementation)
    }
}
