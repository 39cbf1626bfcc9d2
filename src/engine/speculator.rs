// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Speculative execution of plans.
//!
//! A plan is instantiated in a clone of the context and left to run until it
//! goes quiet. Quiet means the only inbound message during an idle round trip
//! was the idle reply itself. The clone is always stopped afterwards.

use crate::config::consts::DEFAULT_MAX_SETTLE_ROUNDS;
use crate::engine::description::describe;
use crate::engine::relevance::Relevance;
use crate::errors::{ContextError, SpeculationError};
use crate::observability::messages::speculator::{SpeculationSettled, SpeculationStarted};
use crate::observability::messages::StructuredLog;
use crate::recipe::Recipe;
use crate::runtime::Context;
use tracing::Instrument;

/// Stops a speculative context however `speculate` exits.
struct StopGuard<'a>(&'a Context);

impl Drop for StopGuard<'_> {
    fn drop(&mut self) {
        self.0.stop();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Speculator {
    max_settle_rounds: usize,
}

impl Default for Speculator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SETTLE_ROUNDS)
    }
}

impl Speculator {
    pub fn new(max_settle_rounds: usize) -> Self {
        Self {
            max_settle_rounds: max_settle_rounds.max(1),
        }
    }

    /// Run `plan` in a throwaway clone of `context` and collect the relevance
    /// its particles report. `context` itself is never touched.
    pub async fn speculate(
        &self,
        context: &Context,
        plan: &Recipe,
        hash: &str,
    ) -> Result<Relevance, SpeculationError> {
        let speculative = context.clone_for_speculative_execution();
        let _guard = StopGuard(&speculative);
        let started = SpeculationStarted {
            context: speculative.id(),
            hash,
        };
        started.log();
        let span = started.span("speculate");

        async {
            speculative.instantiate(plan)?;

            let mut relevance = Relevance::default();
            for round in 1..=self.max_settle_rounds {
                speculative.scheduler().idle().await;
                let before = speculative.message_count();
                let report = speculative.idle().await.map_err(|error| match error {
                    ContextError::Channel(channel) => SpeculationError::Channel(channel),
                    other => SpeculationError::Instantiation(other),
                })?;
                relevance.apply(report);
                if speculative.message_count() == before + 1 {
                    relevance.settle_rounds = round;
                    relevance.description = speculative
                        .last_recipe()
                        .map(|recipe| describe(&recipe, &speculative));
                    SpeculationSettled {
                        hash,
                        rounds: round,
                        score: relevance.calc_relevance_score(),
                    }
                    .log();
                    return Ok(relevance);
                }
            }
            Err(SpeculationError::NeverSettled {
                rounds: self.max_settle_rounds,
            })
        }
        .instrument(span)
        .await
    }
}
