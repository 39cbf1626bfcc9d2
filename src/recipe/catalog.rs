// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Particle specs and seed recipes known to a context.

use crate::recipe::model::{ParticleNode, ParticleSpec, Recipe};
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    particles: IndexMap<String, ParticleSpec>,
    recipes: Vec<Recipe>,
}

impl Catalog {
    /// Seed recipes get specs attached to every particle that names a known spec.
    pub fn new(particles: Vec<ParticleSpec>, recipes: Vec<Recipe>) -> Self {
        let particles: IndexMap<String, ParticleSpec> = particles
            .into_iter()
            .map(|spec| (spec.name.clone(), spec))
            .collect();
        let recipes = recipes
            .into_iter()
            .map(|mut recipe| {
                for index in 0..recipe.particles.len() {
                    let spec = recipe.particles[index]
                        .name
                        .as_ref()
                        .and_then(|name| particles.get(name))
                        .cloned();
                    if let Some(spec) = spec {
                        recipe.attach_spec(index, &spec);
                    }
                }
                recipe
            })
            .collect();
        Self { particles, recipes }
    }

    pub fn spec(&self, name: &str) -> Option<&ParticleSpec> {
        self.particles.get(name)
    }

    pub fn specs(&self) -> impl Iterator<Item = &ParticleSpec> {
        self.particles.values()
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn by_verb<'a>(&'a self, verb: &'a str) -> impl Iterator<Item = &'a ParticleSpec> + 'a {
        self.particles
            .values()
            .filter(move |spec| spec.verbs.iter().any(|v| v.eq_ignore_ascii_case(verb)))
    }

    /// Specs a search token could mean: exact name (case-insensitive) or verb.
    pub fn for_token<'a>(&'a self, token: &'a str) -> impl Iterator<Item = &'a ParticleSpec> + 'a {
        self.particles.values().filter(move |spec| {
            spec.name.eq_ignore_ascii_case(token)
                || spec.verbs.iter().any(|v| v.eq_ignore_ascii_case(token))
        })
    }

    pub fn particle_node(&self, name: &str) -> Option<ParticleNode> {
        self.spec(name).map(ParticleNode::from_spec)
    }
}
