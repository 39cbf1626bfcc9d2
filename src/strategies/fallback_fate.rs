// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::Descendant;
use crate::errors::PlanningError;
use crate::recipe::{Fate, Recipe, RecipeWalker, Visit, WalkMode};
use crate::strategies::over;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;

/// Decides the fate of `?` views already bound to a context view: `copy`
/// when anything writes them, `map` when they are only read.
pub struct FallbackFate;

impl RecipeWalker for FallbackFate {
    fn on_view(&self, recipe: &Recipe, view: usize) -> Visit {
        let node = &recipe.views[view];
        if node.fate != Fate::Unresolved || node.id.is_none() {
            return Visit::Skip;
        }
        let counts = recipe.direction_counts(view);
        let fate = if counts.writes > 0 {
            Fate::Copy
        } else if counts.reads > 0 {
            Fate::Map
        } else {
            return Visit::Skip;
        };
        Visit::one(move |recipe: &mut Recipe| {
            recipe.views[view].fate = fate;
            0.0
        })
    }
}

#[async_trait]
impl Strategy for FallbackFate {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        Ok(over(input.generated, self, WalkMode::Permuted, self.name()))
    }

    fn name(&self) -> &'static str {
        "FallbackFate"
    }
}
