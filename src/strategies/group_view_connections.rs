// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::Descendant;
use crate::errors::PlanningError;
use crate::recipe::{Recipe, RecipeWalker, ViewNode, ViewType, Visit, WalkMode};
use crate::strategies::over;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;
use indexmap::IndexMap;

/// Joins unbound connections of the same type on different particles
/// through a shared `?` view, so particles a search brought in end up
/// talking to each other. A group takes at most one connection per particle
/// and at most one writer. Skips recipes that still have unnamed or untyped
/// unbound connections.
pub struct GroupViewConnections;

/// `(particle, connection)` index pairs that will share one view.
type Group = Vec<(usize, usize)>;

fn groups(recipe: &Recipe) -> Option<Vec<Group>> {
    let mut by_type: IndexMap<ViewType, Vec<(usize, usize)>> = IndexMap::new();
    for (p, particle) in recipe.particles.iter().enumerate() {
        for (c, connection) in particle.connections.iter().enumerate() {
            if connection.view.is_some() {
                continue;
            }
            let view_type = connection.view_type.clone().filter(|_| connection.name.is_some())?;
            by_type.entry(view_type).or_default().push((p, c));
        }
    }

    let writes = |(p, c): (usize, usize)| {
        recipe.particles[p].connections[c]
            .direction
            .is_some_and(|d| d.writes())
    };

    let mut grouped = Vec::new();
    for connections in by_type.into_values() {
        // Particles with the most connections of this type seed the groups.
        let mut particles: Vec<usize> = connections.iter().map(|(p, _)| *p).collect();
        particles.dedup();
        let count = |p: usize| connections.iter().filter(|(q, _)| *q == p).count();
        particles.sort_by_key(|p| std::cmp::Reverse(count(*p)));

        let mut type_groups: Vec<Group> = Vec::new();
        for particle in particles {
            for &member in connections.iter().filter(|(p, _)| *p == particle) {
                let has_writer = |group: &Group| group.iter().any(|m| writes(*m));
                let open: Vec<usize> = type_groups
                    .iter()
                    .enumerate()
                    .filter(|(_, group)| {
                        group.iter().all(|(p, _)| *p != particle)
                            && !(writes(member) && has_writer(group))
                    })
                    .map(|(index, _)| index)
                    .collect();
                // A reader prefers a group with a writer, a writer one without.
                let chosen = open
                    .iter()
                    .copied()
                    .find(|&index| has_writer(&type_groups[index]) != writes(member))
                    .or_else(|| open.first().copied());
                match chosen {
                    Some(index) => type_groups[index].push(member),
                    None => type_groups.push(vec![member]),
                }
            }
        }
        grouped.extend(type_groups.into_iter().filter(|group| group.len() > 1));
    }
    Some(grouped)
}

impl RecipeWalker for GroupViewConnections {
    fn on_recipe(&self, recipe: &Recipe) -> Visit {
        let Some(grouped) = groups(recipe) else {
            return Visit::Skip;
        };
        if grouped.is_empty() {
            return Visit::Skip;
        }
        Visit::one(move |recipe: &mut Recipe| {
            for group in &grouped {
                let view = recipe.add_view(ViewNode::default());
                for (particle, connection) in group {
                    recipe.connect(*particle, *connection, view);
                }
            }
            grouped.len() as f64
        })
    }
}

#[async_trait]
impl Strategy for GroupViewConnections {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        Ok(over(input.generated, self, WalkMode::Permuted, self.name()))
    }

    fn name(&self) -> &'static str {
        "GroupViewConnections"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Fate, ParticleNode};
    use crate::strategies::fixtures::{run, transform};

    fn particles(names: &[&str]) -> Recipe {
        let mut recipe = Recipe::default();
        for name in names {
            recipe.particles.push(ParticleNode::from_spec(&transform(name, &[])));
        }
        recipe
    }

    #[tokio::test]
    async fn test_writer_and_reader_share_a_view() {
        let out = run(&GroupViewConnections, 1, vec![particles(&["Upper", "Reverse"])]).await;
        assert_eq!(out.len(), 1);
        let recipe = &out[0].recipe;

        // Upper.input + Reverse.output, then Upper.output + Reverse.input.
        assert_eq!(recipe.views.len(), 2);
        assert!(recipe.views.iter().all(|v| v.fate == Fate::Unresolved));
        assert_eq!(recipe.views[0].view_type, Some(ViewType::entity("Text")));
        assert_eq!(recipe.view_connections(0), vec![(0, 0), (1, 1)]);
        assert_eq!(recipe.view_connections(1), vec![(0, 1), (1, 0)]);
        assert_eq!(out[0].score, 2.0);
    }

    #[tokio::test]
    async fn test_lone_and_unnamed_connections_are_skipped() {
        let mut unnamed = particles(&["Upper", "Reverse"]);
        unnamed.particles[1].connections[0].name = None;

        for recipe in [particles(&["Upper"]), unnamed, Recipe::default()] {
            assert!(run(&GroupViewConnections, 1, vec![recipe]).await.is_empty());
        }
    }
}
