// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::strategizer::{Candidate, Descendant};
use crate::errors::PlanningError;

/// What a strategy sees for one search step.
pub struct StrategyInput<'a> {
    /// The step being produced; seeding strategies act on generation 0.
    pub generation: usize,
    /// The previous step's new candidates.
    pub generated: &'a [Candidate],
    pub population: &'a [Candidate],
}

#[async_trait]
pub trait Strategy: Send + Sync {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError>;

    fn name(&self) -> &'static str;
}
