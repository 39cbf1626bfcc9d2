// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::Descendant;
use crate::errors::PlanningError;
use crate::recipe::{Catalog, Recipe, RecipeWalker, Update, Visit, WalkMode};
use crate::strategies::over;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;
use std::sync::Arc;

/// Replaces verb-only particles with each catalog particle that has the verb.
pub struct MatchParticleByVerb {
    catalog: Arc<Catalog>,
}

impl MatchParticleByVerb {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

struct VerbWalker<'a> {
    catalog: &'a Catalog,
}

impl RecipeWalker for VerbWalker<'_> {
    fn on_particle(&self, recipe: &Recipe, particle: usize) -> Visit {
        let node = &recipe.particles[particle];
        let Some(verb) = node.verb.as_deref() else {
            return Visit::Skip;
        };
        if node.spec.is_some() {
            return Visit::Skip;
        }
        let updates: Vec<Update> = self
            .catalog
            .by_verb(verb)
            .cloned()
            .map(|spec| {
                Box::new(move |recipe: &mut Recipe| {
                    recipe.attach_spec(particle, &spec);
                    1.0
                }) as Update
            })
            .collect();
        Visit::Propose(updates)
    }
}

#[async_trait]
impl Strategy for MatchParticleByVerb {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        let walker = VerbWalker {
            catalog: &self.catalog,
        };
        Ok(over(input.generated, &walker, WalkMode::Permuted, self.name()))
    }

    fn name(&self) -> &'static str {
        "MatchParticleByVerb"
    }
}
