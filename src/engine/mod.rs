// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod description;
pub mod planner;
pub mod relevance;
pub mod speculator;
pub mod strategizer;
#[cfg(test)]
mod integration_tests;

pub use description::describe;
pub use planner::{Planner, Suggestion};
pub use relevance::{Relevance, RelevancePolicy, ThresholdPolicy};
pub use speculator::Speculator;
pub use strategizer::{
    Candidate, Derivation, Descendant, Generation, GenerationEntry, Strategizer, StrategizerOptions,
};
