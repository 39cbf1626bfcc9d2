// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The default strategy pipeline.
//!
//! Strategies run in this order every generation: seeding, search token
//! matching with grouping, fate defaulting, view creation, binding and
//! mapping, then naming and cleanup. Each one sees the same snapshot of the
//! previous generation.

mod add_use_views;
mod assign_views_by_tag_and_type;
mod combined;
mod convert_constraints_to_connections;
mod create_views;
mod fallback_fate;
mod group_view_connections;
mod init_population;
mod init_search;
mod map_consumed_slots;
mod match_particle_by_verb;
mod name_unnamed_connections;
mod search_tokens_to_particles;

pub use add_use_views::AddUseViews;
pub use assign_views_by_tag_and_type::AssignViewsByTagAndType;
pub use combined::CombinedStrategy;
pub use convert_constraints_to_connections::ConvertConstraintsToConnections;
pub use create_views::CreateViews;
pub use fallback_fate::FallbackFate;
pub use group_view_connections::GroupViewConnections;
pub use init_population::InitPopulation;
pub use init_search::InitSearch;
pub use map_consumed_slots::MapConsumedSlots;
pub use match_particle_by_verb::MatchParticleByVerb;
pub use name_unnamed_connections::NameUnnamedConnections;
pub use search_tokens_to_particles::SearchTokensToParticles;

use crate::engine::strategizer::{Candidate, Descendant};
use crate::recipe::{walk, RecipeWalker, WalkMode};
use crate::runtime::Context;
use crate::traits::Strategy;
use std::sync::Arc;

/// The pipeline `Planner::init` uses.
pub fn default_strategies(context: &Arc<Context>) -> Vec<Arc<dyn Strategy>> {
    let catalog = Arc::clone(context.catalog());
    vec![
        Arc::new(InitPopulation::new(Arc::clone(&catalog))),
        Arc::new(InitSearch::new(Arc::clone(context))),
        Arc::new(CombinedStrategy::new(vec![
            Arc::new(SearchTokensToParticles::new(Arc::clone(&catalog))),
            Arc::new(GroupViewConnections),
        ])),
        Arc::new(FallbackFate),
        Arc::new(CreateViews),
        Arc::new(AssignViewsByTagAndType::new(Arc::clone(context))),
        Arc::new(ConvertConstraintsToConnections::new(Arc::clone(&catalog))),
        Arc::new(MapConsumedSlots::new(Arc::clone(context))),
        Arc::new(MatchParticleByVerb::new(catalog)),
        Arc::new(NameUnnamedConnections),
        Arc::new(AddUseViews),
    ]
}

/// Walk every candidate and turn what the walker proposes into descendants.
pub(crate) fn over<W: RecipeWalker + ?Sized>(
    candidates: &[Candidate],
    walker: &W,
    mode: WalkMode,
    strategy: &'static str,
) -> Vec<Descendant> {
    candidates
        .iter()
        .flat_map(|parent| {
            walk(walker, mode, &parent.recipe)
                .into_iter()
                .map(move |(recipe, delta)| Descendant::from_parent(parent, recipe, delta, strategy))
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::backends::stub::StubParticleFactory;
    use crate::engine::strategizer::{Candidate, Descendant};
    use crate::recipe::{Catalog, ConnectionSpec, Direction, ParticleSpec, Recipe, SlotSpec, ViewType};
    use crate::runtime::{Context, Scheduler};
    use crate::traits::{Strategy, StrategyInput};
    use std::sync::Arc;

    pub fn connection(name: &str, direction: Direction) -> ConnectionSpec {
        ConnectionSpec {
            name: name.into(),
            direction,
            view_type: ViewType::entity("Text"),
            tags: vec![],
        }
    }

    /// `input` (in) and `output` (out), both `Text`.
    pub fn transform(name: &str, verbs: &[&str]) -> ParticleSpec {
        ParticleSpec {
            name: name.into(),
            implementation: "stub".into(),
            verbs: verbs.iter().map(|v| v.to_string()).collect(),
            description: None,
            connections: vec![
                connection("input", Direction::In),
                connection("output", Direction::Out),
            ],
            slots: vec![],
        }
    }

    pub fn with_slot(mut spec: ParticleSpec, slot: &str) -> ParticleSpec {
        spec.slots.push(SlotSpec { name: slot.into() });
        spec
    }

    pub fn catalog(specs: Vec<ParticleSpec>) -> Arc<Catalog> {
        Arc::new(Catalog::new(specs, vec![]))
    }

    pub fn context(catalog: Catalog) -> Arc<Context> {
        Arc::new(Context::new(
            "ctx",
            Arc::new(catalog),
            Arc::new(StubParticleFactory),
            Scheduler::new(),
        ))
    }

    pub fn candidate(recipe: Recipe) -> Candidate {
        Candidate::seed(recipe, "test")
    }

    pub async fn run(strategy: &dyn Strategy, generation: usize, recipes: Vec<Recipe>) -> Vec<Descendant> {
        let generated: Vec<Candidate> = recipes.into_iter().map(candidate).collect();
        let input = StrategyInput {
            generation,
            generated: &generated,
            population: &generated,
        };
        strategy.generate(&input).await.unwrap()
    }
}
