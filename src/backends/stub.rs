// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::errors::ParticleError;
use crate::runtime::ParticleHost;
use crate::traits::{Particle, ParticleFactory};

/// A stub particle that does nothing but report itself relevant
pub struct StubParticle;

#[async_trait::async_trait]
impl Particle for StubParticle {
    async fn setup(&self, host: &ParticleHost) -> Result<(), ParticleError> {
        host.set_relevance(1.0);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// A particle whose setup always fails, for speculation failure scenarios
pub struct FailingParticle;

#[async_trait::async_trait]
impl Particle for FailingParticle {
    async fn setup(&self, _host: &ParticleHost) -> Result<(), ParticleError> {
        Err(ParticleError::Failed("Simulated particle failure".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// A particle that reports negative relevance, so its plans are dropped
pub struct IrrelevantParticle;

#[async_trait::async_trait]
impl Particle for IrrelevantParticle {
    async fn setup(&self, host: &ParticleHost) -> Result<(), ParticleError> {
        host.set_relevance(-1.0);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "irrelevant"
    }
}

/// Drops empty strings from its `items` collection and reports relevant
/// when anything is left
pub struct PruningParticle;

#[async_trait::async_trait]
impl Particle for PruningParticle {
    async fn setup(&self, host: &ParticleHost) -> Result<(), ParticleError> {
        let items = host.view("items")?;
        let mut kept = 0;
        for item in items.to_list().await? {
            if item.as_str().is_some_and(str::is_empty) {
                items.remove(item)?;
            } else {
                kept += 1;
            }
        }
        host.set_relevance(if kept > 0 { 1.0 } else { 0.0 });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "pruning"
    }
}

pub struct StubParticleFactory;

impl ParticleFactory for StubParticleFactory {
    fn create_particle(&self, implementation: &str) -> Result<Arc<dyn Particle>, String> {
        match implementation {
            "stub" => Ok(Arc::new(StubParticle)),
            "failing" => Ok(Arc::new(FailingParticle)),
            "irrelevant" => Ok(Arc::new(IrrelevantParticle)),
            "pruning" => Ok(Arc::new(PruningParticle)),
            _ => Err(format!("Unknown stub particle implementation: '{}'", implementation)),
        }
    }

    fn list_available_implementations(&self) -> Vec<&'static str> {
        vec!["stub", "failing", "irrelevant", "pruning"]
    }
}
