// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value as Json;

use super::{relevance_of, text_of};
use crate::errors::ParticleError;
use crate::runtime::ParticleHost;
use crate::traits::Particle;

/// Reads `input`, writes it reversed by character to `output`.
pub struct ReverseTextParticle;

impl ReverseTextParticle {
    pub fn new() -> Self {
        Self
    }

    pub fn reverse(input: &str) -> String {
        input.chars().rev().collect()
    }
}

impl Default for ReverseTextParticle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Particle for ReverseTextParticle {
    async fn setup(&self, host: &ParticleHost) -> Result<(), ParticleError> {
        let input = text_of(&host.view("input")?.get().await?);
        host.view("output")?.set(Json::String(Self::reverse(&input)))?;
        host.set_relevance(relevance_of(&input));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "reverse_text"
    }
}
