// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Planning and suggestions for one context.
//!
//! [`Planner::plan`] runs the strategy pipeline generation by generation and
//! collects every resolved recipe. [`Planner::suggest`] then speculatively
//! executes each plan, keeps the relevant ones and describes them.
//!
//! # Example
//! ```no_run
//! use the_arcwood::backends::local::LocalParticleFactory;
//! use the_arcwood::config::{load_manifest, ArcwoodConfig};
//! use the_arcwood::engine::Planner;
//! use the_arcwood::runtime::{Context, Scheduler};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = load_manifest("demos/manifest.yaml")?;
//! let context = Arc::new(Context::from_manifest(
//!     "demo",
//!     &manifest,
//!     Arc::new(LocalParticleFactory),
//!     Scheduler::new(),
//! )?);
//! let mut planner = Planner::init(context, &ArcwoodConfig::default());
//! for suggestion in planner.suggest(Duration::from_secs(1), None).await? {
//!     println!("{} {}", suggestion.hash, suggestion.description);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::ArcwoodConfig;
use crate::engine::description::describe;
use crate::engine::relevance::{RelevancePolicy, ThresholdPolicy};
use crate::engine::speculator::Speculator;
use crate::engine::strategizer::{Generation, GenerationEntry, Strategizer, StrategizerOptions};
use crate::errors::PlanningError;
use crate::observability::messages::planner::{
    PlanSkipped, PlanningCompleted, PlanningTimedOut, SkipReason, SuggestionsCompleted,
};
use crate::observability::messages::speculator::SpeculationFailed;
use crate::observability::messages::StructuredLog;
use crate::recipe::shape::matches_active;
use crate::recipe::{Recipe, Search};
use crate::runtime::Context;
use crate::strategies::default_strategies;
use crate::traits::Strategy;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Suggestion {
    pub plan: Recipe,
    pub rank: f64,
    pub description: String,
    /// Trailing characters of the plan's digest.
    pub hash: String,
}

pub struct Planner {
    context: Arc<Context>,
    options: StrategizerOptions,
    strategizer: Strategizer,
    speculator: Speculator,
    policy: Arc<dyn RelevancePolicy>,
    digest_suffix_length: usize,
}

impl Planner {
    pub fn init(context: Arc<Context>, config: &ArcwoodConfig) -> Self {
        let options = StrategizerOptions::from(&config.planner);
        let strategizer = Strategizer::new(default_strategies(&context), options);
        Self {
            context,
            options,
            strategizer,
            speculator: Speculator::new(config.speculation.get_max_settle_rounds()),
            policy: Arc::new(ThresholdPolicy {
                threshold: config.speculation.get_relevance_threshold(),
            }),
            digest_suffix_length: config.suggestions.get_digest_suffix_length(),
        }
    }

    /// Replace the pipeline. Search state starts over.
    pub fn with_strategies(mut self, strategies: Vec<Arc<dyn Strategy>>) -> Self {
        self.strategizer = Strategizer::new(strategies, self.options);
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn RelevancePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn short_hash(&self, digest: &str) -> String {
        digest[digest.len().saturating_sub(self.digest_suffix_length)..].to_string()
    }

    /// Run generations until one produces nothing new or `timeout` has passed,
    /// and return every resolved recipe found. The timeout is checked between
    /// generations, so at least one always runs.
    pub async fn plan(
        &mut self,
        timeout: Duration,
        mut generations: Option<&mut Vec<Generation>>,
    ) -> Result<Vec<Recipe>, PlanningError> {
        let started = Instant::now();
        let mut resolved = Vec::new();
        let mut ran = 0;
        loop {
            let produced = self.strategizer.generate().await?;
            ran += 1;
            if let Some(log) = generations.as_deref_mut() {
                log.push(self.strategizer.record());
            }
            resolved.extend(
                self.strategizer
                    .generated()
                    .iter()
                    .filter(|candidate| candidate.recipe.is_resolved())
                    .map(|candidate| candidate.recipe.clone()),
            );
            if produced == 0 {
                break;
            }
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                PlanningTimedOut {
                    elapsed,
                    generation: self.strategizer.generation().saturating_sub(1),
                    resolved: resolved.len(),
                }
                .log();
                break;
            }
        }
        PlanningCompleted {
            generations: ran,
            resolved: resolved.len(),
            duration: started.elapsed(),
        }
        .log();
        Ok(resolved)
    }

    /// Plan, then turn relevant plans into suggestions. Ordering is left to
    /// the caller.
    pub async fn suggest(
        &mut self,
        timeout: Duration,
        mut generations: Option<&mut Vec<Generation>>,
    ) -> Result<Vec<Suggestion>, PlanningError> {
        let plans = self.plan(timeout, generations.as_deref_mut()).await?;
        let active = self.context.active_recipe();
        let search = self.context.search();
        let mut emitted = HashSet::new();
        let mut suggestions = Vec::new();

        for plan in &plans {
            let digest = plan.digest();
            let hash = self.short_hash(&digest);

            if matches_active(&active, plan) {
                update_generation(generations.as_deref_mut(), &digest, |entry| entry.active = true);
                PlanSkipped {
                    hash: &hash,
                    reason: SkipReason::Active,
                }
                .log();
                continue;
            }

            let relevance = match self.speculator.speculate(&self.context, plan, &hash).await {
                Ok(relevance) => relevance,
                Err(error) => {
                    SpeculationFailed {
                        hash: &hash,
                        error: &error,
                    }
                    .log();
                    continue;
                }
            };
            if !self.policy.is_relevant(&relevance) {
                PlanSkipped {
                    hash: &hash,
                    reason: SkipReason::Irrelevant,
                }
                .log();
                continue;
            }
            let rank = self.policy.rank(&relevance);
            let description = relevance
                .description
                .clone()
                .unwrap_or_else(|| describe(plan, &self.context));
            update_generation(generations.as_deref_mut(), &digest, |entry| {
                entry.description = Some(description.clone())
            });

            if let Some(search) = &search {
                let from_search = plan.search.as_ref().is_some_and(Search::contributed);
                let phrase = search.phrase.to_lowercase();
                if !from_search && !description.to_lowercase().contains(&phrase) {
                    PlanSkipped {
                        hash: &hash,
                        reason: SkipReason::SearchMismatch,
                    }
                    .log();
                    continue;
                }
            }

            if !emitted.insert(digest) {
                PlanSkipped {
                    hash: &hash,
                    reason: SkipReason::Duplicate,
                }
                .log();
                continue;
            }
            suggestions.push(Suggestion {
                plan: plan.clone(),
                rank,
                description,
                hash,
            });
        }

        SuggestionsCompleted {
            plans: plans.len(),
            suggestions: suggestions.len(),
        }
        .log();
        Ok(suggestions)
    }
}

fn update_generation(
    generations: Option<&mut Vec<Generation>>,
    digest: &str,
    update: impl Fn(&mut GenerationEntry),
) {
    let Some(generations) = generations else {
        return;
    };
    generations
        .iter_mut()
        .flat_map(|generation| generation.entries.iter_mut())
        .filter(|entry| entry.hash == digest)
        .for_each(update);
}
