// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::Descendant;
use crate::errors::PlanningError;
use crate::recipe::{Recipe, RecipeWalker, SlotNode, Update, Visit, WalkMode};
use crate::runtime::Context;
use crate::strategies::over;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;
use std::sync::Arc;

/// Binds unbound consumed slots to context slots of the same name.
pub struct MapConsumedSlots {
    context: Arc<Context>,
}

impl MapConsumedSlots {
    pub fn new(context: Arc<Context>) -> Self {
        Self { context }
    }
}

struct SlotWalker<'a> {
    slots: &'a [SlotNode],
}

impl RecipeWalker for SlotWalker<'_> {
    fn on_slot(&self, recipe: &Recipe, particle: usize, slot: usize) -> Visit {
        let consumed = &recipe.particles[particle].consumed_slots[slot];
        if consumed.slot.is_some() {
            return Visit::Skip;
        }
        let updates: Vec<Update> = self
            .slots
            .iter()
            .filter(|candidate| candidate.name == consumed.name)
            .cloned()
            .map(|target| {
                Box::new(move |recipe: &mut Recipe| {
                    let index = recipe
                        .slots
                        .iter()
                        .position(|s| s.id.is_some() && s.id == target.id)
                        .unwrap_or_else(|| {
                            recipe.slots.push(target.clone());
                            recipe.slots.len() - 1
                        });
                    recipe.particles[particle].consumed_slots[slot].slot = Some(index);
                    1.0
                }) as Update
            })
            .collect();
        Visit::Propose(updates)
    }
}

#[async_trait]
impl Strategy for MapConsumedSlots {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        let walker = SlotWalker {
            slots: self.context.slots(),
        };
        Ok(over(input.generated, &walker, WalkMode::Permuted, self.name()))
    }

    fn name(&self) -> &'static str {
        "MapConsumedSlots"
    }
}
