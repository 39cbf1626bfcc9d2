// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Generational recipe search.
//!
//! Each call to [`Strategizer::generate`] runs every strategy, in pipeline
//! order, against the same snapshot: the candidates the previous step produced.
//! Descendants are deduplicated by content digest across the whole run, so the
//! first strategy to produce a recipe owns it. New candidates join a population
//! kept sorted by score and capped at `max_population`.

use crate::config::consts::{DEFAULT_DISCARD_SIZE, DEFAULT_GENERATION_SIZE, DEFAULT_MAX_POPULATION};
use crate::config::PlannerOptions;
use crate::errors::PlanningError;
use crate::observability::messages::planner::{GenerationCompleted, StrategyApplied};
use crate::observability::messages::StructuredLog;
use crate::recipe::Recipe;
use crate::traits::{Strategy, StrategyInput};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Which strategy produced a candidate, and from what.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub strategy: &'static str,
    /// Digest of the parent candidate; `None` for seeds.
    pub parent: Option<String>,
}

/// A recipe in the search, with the score it accumulated on the way.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub recipe: Recipe,
    /// Full content digest.
    pub hash: String,
    pub score: f64,
    pub generation: usize,
    pub derivation: Derivation,
}

impl Candidate {
    pub fn seed(recipe: Recipe, strategy: &'static str) -> Self {
        Self {
            hash: recipe.digest(),
            recipe,
            score: 0.0,
            generation: 0,
            derivation: Derivation {
                strategy,
                parent: None,
            },
        }
    }

    /// Accept a proposal into `generation`, with its digest computed here.
    pub fn from_descendant(descendant: Descendant, generation: usize) -> Self {
        Self {
            hash: descendant.recipe.digest(),
            recipe: descendant.recipe,
            score: descendant.score,
            generation,
            derivation: Derivation {
                strategy: descendant.strategy,
                parent: descendant.parent,
            },
        }
    }
}

/// What a strategy proposes. `score` is absolute: the parent's score plus the
/// strategy's delta.
#[derive(Debug, Clone)]
pub struct Descendant {
    pub recipe: Recipe,
    pub score: f64,
    pub strategy: &'static str,
    pub parent: Option<String>,
}

impl Descendant {
    pub fn from_parent(parent: &Candidate, recipe: Recipe, delta: f64, strategy: &'static str) -> Self {
        Self {
            recipe,
            score: parent.score + delta,
            strategy,
            parent: Some(parent.hash.clone()),
        }
    }
}

/// One row of the generation log callers may ask `plan` and `suggest` for.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationEntry {
    pub hash: String,
    pub strategy: &'static str,
    pub parent: Option<String>,
    pub score: f64,
    pub resolved: bool,
    /// Filled in by `suggest` for plans that became suggestions.
    pub description: Option<String>,
    /// The plan's shape is already running in the context.
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub generation: usize,
    pub entries: Vec<GenerationEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategizerOptions {
    pub max_population: usize,
    pub generation_size: usize,
    pub discard_size: usize,
}

impl Default for StrategizerOptions {
    fn default() -> Self {
        Self {
            max_population: DEFAULT_MAX_POPULATION,
            generation_size: DEFAULT_GENERATION_SIZE,
            discard_size: DEFAULT_DISCARD_SIZE,
        }
    }
}

impl From<&PlannerOptions> for StrategizerOptions {
    fn from(options: &PlannerOptions) -> Self {
        Self {
            max_population: options.get_max_population().max(1),
            generation_size: options.get_generation_size().max(1),
            discard_size: options.get_discard_size(),
        }
    }
}

pub struct Strategizer {
    strategies: Vec<Arc<dyn Strategy>>,
    options: StrategizerOptions,
    generation: usize,
    generated: Vec<Candidate>,
    population: Vec<Candidate>,
    seen: HashSet<String>,
}

impl Strategizer {
    pub fn new(strategies: Vec<Arc<dyn Strategy>>, options: StrategizerOptions) -> Self {
        Self {
            strategies,
            options,
            generation: 0,
            generated: Vec::new(),
            population: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Start from `seeds` as generation 0; the first `generate` call produces
    /// generation 1.
    pub fn with_seed(
        strategies: Vec<Arc<dyn Strategy>>,
        options: StrategizerOptions,
        seeds: Vec<Recipe>,
    ) -> Self {
        let mut strategizer = Self::new(strategies, options);
        for recipe in seeds {
            let candidate = Candidate::seed(recipe, "seed");
            if strategizer.seen.insert(candidate.hash.clone()) {
                strategizer.generated.push(candidate);
            }
        }
        strategizer.population = strategizer.generated.clone();
        strategizer.generation = 1;
        strategizer
    }

    /// The step `generate` will produce next.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// New candidates from the last step.
    pub fn generated(&self) -> &[Candidate] {
        &self.generated
    }

    /// Every surviving candidate, best score first.
    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Log row for the last step.
    pub fn record(&self) -> Generation {
        Generation {
            generation: self.generation.saturating_sub(1),
            entries: self
                .generated
                .iter()
                .map(|candidate| GenerationEntry {
                    hash: candidate.hash.clone(),
                    strategy: candidate.derivation.strategy,
                    parent: candidate.derivation.parent.clone(),
                    score: candidate.score,
                    resolved: candidate.recipe.is_resolved(),
                    description: None,
                    active: false,
                })
                .collect(),
        }
    }

    /// Run one step. Returns how many new candidates it produced.
    pub async fn generate(&mut self) -> Result<usize, PlanningError> {
        let started = Instant::now();
        let generation = self.generation;

        let mut descendants = Vec::new();
        {
            let input = StrategyInput {
                generation,
                generated: &self.generated,
                population: &self.population,
            };
            for strategy in &self.strategies {
                let proposed = strategy.generate(&input).await?;
                StrategyApplied {
                    strategy: strategy.name(),
                    generation,
                    descendants: proposed.len(),
                }
                .log();
                descendants.extend(proposed);
            }
        }

        let mut duplicates = 0;
        let mut generated = Vec::new();
        for descendant in descendants {
            if generated.len() >= self.options.generation_size {
                break;
            }
            let candidate = Candidate::from_descendant(descendant, generation);
            if !self.seen.insert(candidate.hash.clone()) {
                duplicates += 1;
                continue;
            }
            generated.push(candidate);
        }

        self.population.extend(generated.iter().cloned());
        self.population
            .sort_by(|a, b| b.score.total_cmp(&a.score));
        if self.population.len() > self.options.max_population {
            let keep = self
                .population
                .len()
                .saturating_sub(self.options.discard_size);
            self.population.truncate(keep);
            self.population.truncate(self.options.max_population);
        }

        self.generated = generated;
        self.generation += 1;

        GenerationCompleted {
            generation,
            generated: self.generated.len(),
            duplicates,
            population: self.population.len(),
            duration: started.elapsed(),
        }
        .log();
        Ok(self.generated.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Fate, ViewNode};
    use async_trait::async_trait;

    /// Adds one view per step, up to `depth` views, in `width` variants.
    struct Grow {
        width: usize,
        depth: usize,
    }

    #[async_trait]
    impl Strategy for Grow {
        async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
            if input.generation == 0 {
                return Ok(vec![Descendant {
                    recipe: Recipe::default(),
                    score: 0.0,
                    strategy: self.name(),
                    parent: None,
                }]);
            }
            let mut out = Vec::new();
            for parent in input.generated {
                if parent.recipe.views.len() >= self.depth {
                    continue;
                }
                for variant in 0..self.width {
                    let mut recipe = parent.recipe.clone();
                    recipe.add_view(ViewNode {
                        local_name: Some(format!("v{}", variant)),
                        ..ViewNode::with_fate(Fate::Create)
                    });
                    out.push(Descendant::from_parent(parent, recipe, variant as f64, self.name()));
                }
            }
            Ok(out)
        }

        fn name(&self) -> &'static str {
            "grow"
        }
    }

    /// Proposes the same recipe as `Grow` does at generation 0.
    struct Echo;

    #[async_trait]
    impl Strategy for Echo {
        async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
            if input.generation != 0 {
                return Ok(vec![]);
            }
            Ok(vec![Descendant {
                recipe: Recipe::default(),
                score: 5.0,
                strategy: self.name(),
                parent: None,
            }])
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    struct Broken;

    #[async_trait]
    impl Strategy for Broken {
        async fn generate(&self, _input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
            Err(PlanningError::Strategy {
                strategy: "broken",
                reason: "always".into(),
            })
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn options(max_population: usize, generation_size: usize, discard_size: usize) -> StrategizerOptions {
        StrategizerOptions {
            max_population,
            generation_size,
            discard_size,
        }
    }

    #[tokio::test]
    async fn test_first_producer_wins_duplicates() {
        let mut strategizer = Strategizer::new(
            vec![Arc::new(Grow { width: 1, depth: 0 }), Arc::new(Echo)],
            StrategizerOptions::default(),
        );
        assert_eq!(strategizer.generate().await.unwrap(), 1);
        assert_eq!(strategizer.generated()[0].derivation.strategy, "grow");
        assert_eq!(strategizer.generated()[0].score, 0.0);
        assert_eq!(strategizer.generation(), 1);
    }

    #[tokio::test]
    async fn test_search_terminates_when_nothing_new() {
        let mut strategizer = Strategizer::new(
            vec![Arc::new(Grow { width: 2, depth: 2 })],
            StrategizerOptions::default(),
        );
        let mut counts = Vec::new();
        loop {
            let produced = strategizer.generate().await.unwrap();
            counts.push(produced);
            if produced == 0 {
                break;
            }
        }
        assert_eq!(counts, vec![1, 2, 4, 0]);
        assert_eq!(strategizer.population().len(), 7);
    }

    #[tokio::test]
    async fn test_population_never_exceeds_cap() {
        let cases = [(5, 100, 2), (5, 100, 0), (3, 2, 1), (1, 100, 20)];
        for (max_population, generation_size, discard_size) in cases {
            let mut strategizer = Strategizer::new(
                vec![Arc::new(Grow { width: 3, depth: 3 })],
                options(max_population, generation_size, discard_size),
            );
            while strategizer.generate().await.unwrap() > 0 {
                assert!(strategizer.population().len() <= max_population);
                assert!(strategizer.generated().len() <= generation_size);
            }
            let scores: Vec<f64> = strategizer.population().iter().map(|c| c.score).collect();
            assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{:?}", scores);
        }
    }

    #[tokio::test]
    async fn test_with_seed_starts_at_generation_one() {
        let mut seed = Recipe::default();
        seed.add_view(ViewNode::with_fate(Fate::Create));
        let mut strategizer = Strategizer::with_seed(
            vec![Arc::new(Grow { width: 1, depth: 2 })],
            StrategizerOptions::default(),
            vec![seed.clone(), seed],
        );
        assert_eq!(strategizer.generated().len(), 1);
        assert_eq!(strategizer.generation(), 1);

        assert_eq!(strategizer.generate().await.unwrap(), 1);
        let record = strategizer.record();
        assert_eq!(record.generation, 1);
        assert_eq!(record.entries[0].strategy, "grow");
        assert_eq!(record.entries[0].parent.as_deref(), Some(strategizer.population()[0].hash.as_str()));
    }

    #[tokio::test]
    async fn test_strategy_errors_propagate() {
        let mut strategizer = Strategizer::new(vec![Arc::new(Broken)], StrategizerOptions::default());
        assert!(matches!(
            strategizer.generate().await,
            Err(PlanningError::Strategy { strategy: "broken", .. })
        ));
    }
}
