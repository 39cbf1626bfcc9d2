// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;      // particle implementations
pub mod channel;       // cross-context messaging + reference mapping
pub mod config;        // planner config + manifests
pub mod engine;        // search, speculation, suggestions
pub mod errors;        // error handling
pub mod observability;
pub mod recipe;        // recipe model, catalog, walker
pub mod runtime;       // execution contexts
pub mod strategies;    // default strategy pipeline
pub mod traits;        // particle + strategy abstractions
