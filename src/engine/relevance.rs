// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::DEFAULT_RELEVANCE_THRESHOLD;
use crate::runtime::IdleReport;
use indexmap::IndexMap;

/// Relevance a speculative run gathered, per particle name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relevance {
    pub relevance_map: IndexMap<String, Vec<f64>>,
    /// Idle rounds it took the run to go quiet.
    pub settle_rounds: usize,
    pub description: Option<String>,
}

impl Relevance {
    pub fn apply(&mut self, report: IdleReport) {
        for (particle, values) in report {
            self.relevance_map.entry(particle).or_default().extend(values);
        }
    }

    /// Product of each particle's mean relevance magnitude. Any negative mean
    /// makes the whole score negative. No observations scores 1.0.
    pub fn calc_relevance_score(&self) -> f64 {
        let mut score = 1.0;
        let mut negative = false;
        for values in self.relevance_map.values() {
            if values.is_empty() {
                continue;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            if mean < 0.0 {
                negative = true;
            }
            score *= mean.abs();
        }
        if negative {
            -score
        } else {
            score
        }
    }
}

/// Decides which speculative runs become suggestions and how they rank.
pub trait RelevancePolicy: Send + Sync {
    fn is_relevant(&self, relevance: &Relevance) -> bool;

    fn rank(&self, relevance: &Relevance) -> f64 {
        relevance.calc_relevance_score()
    }
}

/// Relevant when the score is strictly above `threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub threshold: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_RELEVANCE_THRESHOLD,
        }
    }
}

impl RelevancePolicy for ThresholdPolicy {
    fn is_relevant(&self, relevance: &Relevance) -> bool {
        relevance.calc_relevance_score() > self.threshold
    }
}
