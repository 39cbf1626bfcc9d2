// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Generic tree walk strategies use to propose rewrites.
//!
//! A [`RecipeWalker`] is visited on the recipe, then every view, then every
//! particle with its connections and consumed slots. Each visit may skip, veto
//! the whole recipe, or propose alternative [`Update`]s for that node.
//!
//! In [`WalkMode::Independent`] every update yields its own descendant. In
//! [`WalkMode::Permuted`] one alternative is picked per proposing node and
//! all picks are applied together, so the descendants are the cartesian
//! product of the alternatives. Score deltas add up along a combination.

use crate::observability::messages::planner::PermutationsTruncated;
use crate::observability::messages::StructuredLog;
use crate::recipe::model::Recipe;

/// A rewrite of one recipe clone, returning its score delta.
pub type Update = Box<dyn Fn(&mut Recipe) -> f64 + Send + Sync>;

/// Upper bound on the descendants one permuted walk may produce.
pub const MAX_PERMUTATIONS: usize = 4096;

pub enum Visit {
    Skip,
    /// Stop walking; this recipe produces no descendants.
    Veto,
    /// Alternatives for this node.
    Propose(Vec<Update>),
}

impl Visit {
    pub fn one(update: impl Fn(&mut Recipe) -> f64 + Send + Sync + 'static) -> Self {
        Visit::Propose(vec![Box::new(update)])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    Independent,
    Permuted,
}

pub trait RecipeWalker {
    fn on_recipe(&self, _recipe: &Recipe) -> Visit {
        Visit::Skip
    }

    fn on_view(&self, _recipe: &Recipe, _view: usize) -> Visit {
        Visit::Skip
    }

    fn on_particle(&self, _recipe: &Recipe, _particle: usize) -> Visit {
        Visit::Skip
    }

    fn on_connection(&self, _recipe: &Recipe, _particle: usize, _connection: usize) -> Visit {
        Visit::Skip
    }

    fn on_slot(&self, _recipe: &Recipe, _particle: usize, _slot: usize) -> Visit {
        Visit::Skip
    }
}

/// Walk `recipe` and return each descendant with its accumulated score delta.
pub fn walk<W: RecipeWalker + ?Sized>(walker: &W, mode: WalkMode, recipe: &Recipe) -> Vec<(Recipe, f64)> {
    let mut groups: Vec<Vec<Update>> = Vec::new();

    if !collect(walker.on_recipe(recipe), &mut groups) {
        return Vec::new();
    }
    for view in 0..recipe.views.len() {
        if !collect(walker.on_view(recipe, view), &mut groups) {
            return Vec::new();
        }
    }
    for (index, particle) in recipe.particles.iter().enumerate() {
        if !collect(walker.on_particle(recipe, index), &mut groups) {
            return Vec::new();
        }
        for connection in 0..particle.connections.len() {
            if !collect(walker.on_connection(recipe, index, connection), &mut groups) {
                return Vec::new();
            }
        }
        for slot in 0..particle.consumed_slots.len() {
            if !collect(walker.on_slot(recipe, index, slot), &mut groups) {
                return Vec::new();
            }
        }
    }

    match mode {
        WalkMode::Independent => groups
            .iter()
            .flatten()
            .map(|update| {
                let mut descendant = recipe.clone();
                let score = update(&mut descendant);
                (descendant, score)
            })
            .collect(),
        WalkMode::Permuted => permute(recipe, &groups),
    }
}

/// Returns false on veto.
fn collect(visit: Visit, groups: &mut Vec<Vec<Update>>) -> bool {
    match visit {
        Visit::Skip => true,
        Visit::Veto => false,
        Visit::Propose(updates) => {
            if !updates.is_empty() {
                groups.push(updates);
            }
            true
        }
    }
}

fn permute(recipe: &Recipe, groups: &[Vec<Update>]) -> Vec<(Recipe, f64)> {
    if groups.is_empty() {
        return Vec::new();
    }
    let mut combinations = vec![(recipe.clone(), 0.0)];
    for group in groups {
        let mut next = Vec::with_capacity(combinations.len() * group.len());
        'combine: for (partial, score) in &combinations {
            for update in group {
                if next.len() >= MAX_PERMUTATIONS {
                    PermutationsTruncated {
                        limit: MAX_PERMUTATIONS,
                        alternatives: group.len(),
                    }
                    .log();
                    break 'combine;
                }
                let mut descendant = partial.clone();
                let delta = update(&mut descendant);
                next.push((descendant, score + delta));
            }
        }
        combinations = next;
    }
    combinations
}
