// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::Descendant;
use crate::errors::PlanningError;
use crate::recipe::{Fate, Recipe, RecipeWalker, ViewNode, Visit, WalkMode};
use crate::strategies::over;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;

/// Gives every unbound connection a fresh `use` view. Vetoed while the
/// recipe has constraints, unnamed connections, or views nothing is
/// connected to.
pub struct AddUseViews;

impl RecipeWalker for AddUseViews {
    fn on_recipe(&self, recipe: &Recipe) -> Visit {
        if !recipe.constraints.is_empty() {
            return Visit::Veto;
        }
        if (0..recipe.views.len()).any(|view| recipe.view_connections(view).is_empty()) {
            return Visit::Veto;
        }
        if recipe
            .particles
            .iter()
            .flat_map(|p| &p.connections)
            .any(|c| c.name.is_none())
        {
            return Visit::Veto;
        }
        let disconnected: Vec<(usize, usize)> = recipe
            .particles
            .iter()
            .enumerate()
            .flat_map(|(p, particle)| {
                particle
                    .connections
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.view.is_none())
                    .map(move |(c, _)| (p, c))
            })
            .collect();
        if disconnected.is_empty() {
            return Visit::Skip;
        }
        Visit::one(move |recipe: &mut Recipe| {
            for (particle, connection) in &disconnected {
                let view = recipe.add_view(ViewNode::with_fate(Fate::Use));
                recipe.connect(*particle, *connection, view);
            }
            0.0
        })
    }
}

#[async_trait]
impl Strategy for AddUseViews {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        Ok(over(input.generated, self, WalkMode::Permuted, self.name()))
    }

    fn name(&self) -> &'static str {
        "AddUseViews"
    }
}
