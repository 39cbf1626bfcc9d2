// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod consts;
mod loader;
pub mod manifest;
mod validation;

pub use loader::{
    load_config, ArcwoodConfig, PlannerOptions, SpeculationOptions, SuggestionOptions,
};
pub use manifest::{load_manifest, Manifest, ViewDeclaration};
pub use validation::{load_and_validate_manifest, validate_manifest};
