// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::Descendant;
use crate::errors::PlanningError;
use crate::recipe::Recipe;
use crate::runtime::Context;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;
use std::sync::Arc;

/// Seeds generation 0 with an empty recipe carrying the context's search.
pub struct InitSearch {
    context: Arc<Context>,
}

impl InitSearch {
    pub fn new(context: Arc<Context>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Strategy for InitSearch {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        if input.generation != 0 {
            return Ok(Vec::new());
        }
        let Some(search) = self.context.search() else {
            return Ok(Vec::new());
        };
        if search.is_resolved() {
            return Ok(Vec::new());
        }
        Ok(vec![Descendant {
            recipe: Recipe {
                search: Some(search),
                ..Recipe::default()
            },
            score: 0.0,
            strategy: self.name(),
            parent: None,
        }])
    }

    fn name(&self) -> &'static str {
        "InitSearch"
    }
}
