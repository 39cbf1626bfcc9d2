// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::{Candidate, Descendant};
use crate::errors::PlanningError;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Runs strategies back to back inside one generation. Each stage works on
/// what the stage before it proposed; a proposal the next stage leaves alone
/// passes through unchanged. Descendants keep the parent the first stage
/// gave them.
pub struct CombinedStrategy {
    stages: Vec<Arc<dyn Strategy>>,
}

impl CombinedStrategy {
    pub fn new(stages: Vec<Arc<dyn Strategy>>) -> Self {
        Self { stages }
    }
}

#[async_trait]
impl Strategy for CombinedStrategy {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        let Some((first, rest)) = self.stages.split_first() else {
            return Ok(Vec::new());
        };
        let mut descendants = first.generate(input).await?;

        for stage in rest {
            let staged: Vec<Candidate> = descendants
                .iter()
                .cloned()
                .map(|descendant| Candidate::from_descendant(descendant, input.generation))
                .collect();
            let stage_input = StrategyInput {
                generation: input.generation,
                generated: &staged,
                population: input.population,
            };
            let extended = stage.generate(&stage_input).await?;

            let positions: HashMap<&str, usize> = staged
                .iter()
                .enumerate()
                .map(|(index, candidate)| (candidate.hash.as_str(), index))
                .collect();
            let mut by_origin: Vec<Vec<Descendant>> = vec![Vec::new(); descendants.len()];
            for mut descendant in extended {
                let origin = descendant
                    .parent
                    .as_deref()
                    .and_then(|hash| positions.get(hash))
                    .copied();
                let Some(origin) = origin else {
                    continue;
                };
                descendant.parent = descendants[origin].parent.clone();
                by_origin[origin].push(descendant);
            }

            descendants = descendants
                .into_iter()
                .zip(by_origin)
                .flat_map(|(original, extended)| {
                    if extended.is_empty() {
                        vec![original]
                    } else {
                        extended
                    }
                })
                .collect();
        }
        Ok(descendants)
    }

    fn name(&self) -> &'static str {
        "CombinedStrategy"
    }
}
