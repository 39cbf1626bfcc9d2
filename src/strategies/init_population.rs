// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::Descendant;
use crate::errors::PlanningError;
use crate::recipe::Catalog;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;
use std::sync::Arc;

/// Seeds generation 0 with the catalog's recipes.
pub struct InitPopulation {
    catalog: Arc<Catalog>,
}

impl InitPopulation {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Strategy for InitPopulation {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        if input.generation != 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .catalog
            .recipes()
            .iter()
            .map(|recipe| Descendant {
                recipe: recipe.clone(),
                score: 0.0,
                strategy: self.name(),
                parent: None,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "InitPopulation"
    }
}
