// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Recipe model, catalog, tree walk and shape matching.

pub mod catalog;
pub mod model;
pub mod shape;
pub mod walker;

pub use catalog::Catalog;
pub use model::{
    Connection, ConnectionConstraint, ConnectionSpec, ConstraintEnd, Direction, DirectionCounts,
    Fate, ParticleNode, ParticleSpec, Recipe, Search, SlotConnection, SlotNode, SlotSpec,
    ViewNode, ViewType,
};
pub use walker::{walk, RecipeWalker, Update, Visit, WalkMode};
