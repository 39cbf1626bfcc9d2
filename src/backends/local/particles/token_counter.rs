// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Serialize;

use super::{relevance_of, text_of};
use crate::errors::ParticleError;
use crate::runtime::ParticleHost;
use crate::traits::Particle;

/// Token Counter particle - counts characters, words and lines of `input`
/// into `output`.
pub struct TokenCounterParticle;

impl TokenCounterParticle {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TokenCounterParticle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct TokenCountResult {
    pub char_count: usize,
    pub word_count: usize,
    pub line_count: usize,
}

impl TokenCountResult {
    pub fn of(input: &str) -> Self {
        Self {
            char_count: input.chars().count(),
            word_count: input.split_whitespace().count(),
            line_count: input.lines().count().max(1), // At least 1 line even if empty
        }
    }
}

#[async_trait]
impl Particle for TokenCounterParticle {
    async fn setup(&self, host: &ParticleHost) -> Result<(), ParticleError> {
        let input = text_of(&host.view("input")?.get().await?);
        let counts = serde_json::to_value(TokenCountResult::of(&input))
            .map_err(|e| ParticleError::Failed(format!("Failed to serialize result: {}", e)))?;
        host.view("output")?.set(counts)?;
        host.set_relevance(relevance_of(&input));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "token_counter"
    }
}
