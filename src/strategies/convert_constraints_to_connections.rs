// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::Descendant;
use crate::errors::PlanningError;
use crate::recipe::{Catalog, ConstraintEnd, Recipe, RecipeWalker, ViewNode, Visit, WalkMode};
use crate::strategies::over;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns every connection constraint into a shared `?` view. Particles the
/// recipe does not have yet are added from the catalog. A constraint naming
/// an unknown particle or connection vetoes the recipe.
pub struct ConvertConstraintsToConnections {
    catalog: Arc<Catalog>,
}

impl ConvertConstraintsToConnections {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

struct ConstraintWalker<'a> {
    catalog: &'a Arc<Catalog>,
}

impl ConstraintWalker<'_> {
    fn is_known(&self, recipe: &Recipe, end: &ConstraintEnd) -> bool {
        let in_recipe = recipe
            .particle_by_name(&end.particle)
            .map(|p| recipe.particles[p].connection(&end.connection).is_some());
        let in_catalog = self
            .catalog
            .spec(&end.particle)
            .map(|spec| spec.connection(&end.connection).is_some());
        in_recipe.unwrap_or(false) || in_catalog.unwrap_or(false)
    }
}

/// Index of `end`'s particle and connection, adding the particle or attaching
/// its spec as needed.
fn locate(recipe: &mut Recipe, catalog: &Catalog, end: &ConstraintEnd) -> Option<(usize, usize)> {
    let particle = match recipe.particle_by_name(&end.particle) {
        Some(index) => index,
        None => {
            recipe.particles.push(catalog.particle_node(&end.particle)?);
            recipe.particles.len() - 1
        }
    };
    if recipe.particles[particle].connection(&end.connection).is_none() {
        let spec = catalog.spec(&end.particle)?.clone();
        recipe.attach_spec(particle, &spec);
    }
    let connection = recipe.particles[particle].connection_index(&end.connection)?;
    Some((particle, connection))
}

impl RecipeWalker for ConstraintWalker<'_> {
    fn on_recipe(&self, recipe: &Recipe) -> Visit {
        if recipe.constraints.is_empty() {
            return Visit::Skip;
        }
        if !recipe
            .constraints
            .iter()
            .all(|c| self.is_known(recipe, &c.from) && self.is_known(recipe, &c.to))
        {
            return Visit::Veto;
        }
        let catalog = Arc::clone(self.catalog);
        Visit::one(move |recipe: &mut Recipe| {
            let constraints = std::mem::take(&mut recipe.constraints);
            for constraint in &constraints {
                let (Some(from), Some(to)) = (
                    locate(recipe, &catalog, &constraint.from),
                    locate(recipe, &catalog, &constraint.to),
                ) else {
                    continue;
                };
                let existing = recipe.particles[from.0].connections[from.1]
                    .view
                    .or(recipe.particles[to.0].connections[to.1].view);
                let view = existing.unwrap_or_else(|| recipe.add_view(ViewNode::default()));
                recipe.connect(from.0, from.1, view);
                recipe.connect(to.0, to.1, view);
            }
            1.0
        })
    }
}

#[async_trait]
impl Strategy for ConvertConstraintsToConnections {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        let walker = ConstraintWalker {
            catalog: &self.catalog,
        };
        Ok(over(input.generated, &walker, WalkMode::Permuted, self.name()))
    }

    fn name(&self) -> &'static str {
        "ConvertConstraintsToConnections"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{ConnectionConstraint, Fate};
    use crate::strategies::fixtures::{catalog, run, transform};

    fn constraint(from: (&str, &str), to: (&str, &str)) -> ConnectionConstraint {
        ConnectionConstraint {
            from: ConstraintEnd {
                particle: from.0.into(),
                connection: from.1.into(),
            },
            to: ConstraintEnd {
                particle: to.0.into(),
                connection: to.1.into(),
            },
        }
    }

    #[tokio::test]
    async fn test_constraints_become_shared_views() {
        let strategy = ConvertConstraintsToConnections::new(catalog(vec![
            transform("Upper", &[]),
            transform("Reverse", &[]),
        ]));
        let recipe = Recipe {
            constraints: vec![constraint(("Upper", "output"), ("Reverse", "input"))],
            ..Recipe::default()
        };

        let out = run(&strategy, 1, vec![recipe]).await;
        assert_eq!(out.len(), 1);
        let recipe = &out[0].recipe;
        assert!(recipe.constraints.is_empty());
        assert_eq!(recipe.particles.len(), 2);
        assert_eq!(recipe.views.len(), 1);
        assert_eq!(recipe.views[0].fate, Fate::Unresolved);
        assert_eq!(recipe.particles[0].connection("output").unwrap().view, Some(0));
        assert_eq!(recipe.particles[1].connection("input").unwrap().view, Some(0));
        assert_eq!(recipe.view_connections(0).len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_ends_veto() {
        let strategy = ConvertConstraintsToConnections::new(catalog(vec![transform("Upper", &[])]));
        let cases = [
            constraint(("Upper", "output"), ("Ghost", "input")),
            constraint(("Upper", "sideways"), ("Upper", "input")),
        ];
        for case in cases {
            let recipe = Recipe {
                constraints: vec![case],
                ..Recipe::default()
            };
            assert!(run(&strategy, 1, vec![recipe]).await.is_empty());
        }
    }
}
