// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::Descendant;
use crate::errors::PlanningError;
use crate::recipe::{ConnectionSpec, Recipe, RecipeWalker, Update, ViewType, Visit, WalkMode};
use crate::strategies::over;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;

/// Names connections a recipe declared by type and direction only. Each
/// unnamed connection takes a distinct spec connection that fits it and is
/// not already bound; every such assignment is a descendant. The
/// placeholders `attach_spec` left for the chosen names are dropped.
pub struct NameUnnamedConnections;

/// Assignments of `unnamed[i]` to one of `choices[i]`, no name used twice.
fn assignments(choices: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(choices.len());
    extend(choices, &mut current, &mut out);
    out
}

fn extend(choices: &[Vec<String>], current: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    let Some(options) = choices.get(current.len()) else {
        out.push(current.clone());
        return;
    };
    for name in options {
        if current.contains(name) {
            continue;
        }
        current.push(name.clone());
        extend(choices, current, out);
        current.pop();
    }
}

impl RecipeWalker for NameUnnamedConnections {
    fn on_particle(&self, recipe: &Recipe, particle: usize) -> Visit {
        let node = &recipe.particles[particle];
        let Some(spec) = node.spec.as_ref() else {
            return Visit::Skip;
        };
        let unnamed: Vec<usize> = node
            .connections
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name.is_none())
            .map(|(index, _)| index)
            .collect();
        if unnamed.is_empty() {
            return Visit::Skip;
        }

        let taken = |declared: &ConnectionSpec| {
            node.connections
                .iter()
                .any(|c| c.is_named(&declared.name) && c.view.is_some())
        };
        let choices: Vec<Vec<String>> = unnamed
            .iter()
            .map(|&index| {
                let connection = &node.connections[index];
                let bound_type: Option<&ViewType> = connection
                    .view
                    .and_then(|v| recipe.views.get(v))
                    .and_then(|v| v.view_type.as_ref());
                spec.connections
                    .iter()
                    .filter(|declared| !taken(declared) && connection.fits(declared, bound_type))
                    .map(|declared| declared.name.clone())
                    .collect()
            })
            .collect();

        let updates: Vec<Update> = assignments(&choices)
            .into_iter()
            .map(|names| {
                let unnamed = unnamed.clone();
                let spec = spec.clone();
                Box::new(move |recipe: &mut Recipe| {
                    let node = &mut recipe.particles[particle];
                    for (&index, name) in unnamed.iter().zip(&names) {
                        let connection = &mut node.connections[index];
                        connection.name = Some(name.clone());
                        if let Some(declared) = spec.connection(name) {
                            connection.direction.get_or_insert(declared.direction);
                            connection
                                .view_type
                                .get_or_insert_with(|| declared.view_type.clone());
                            if connection.tags.is_empty() {
                                connection.tags = declared.tags.clone();
                            }
                        }
                    }
                    let mut index = 0;
                    node.connections.retain(|c| {
                        let placeholder = !unnamed.contains(&index)
                            && c.view.is_none()
                            && c.name.as_ref().is_some_and(|n| names.contains(n));
                        index += 1;
                        !placeholder
                    });
                    names.len() as f64
                }) as Update
            })
            .collect();
        Visit::Propose(updates)
    }
}

#[async_trait]
impl Strategy for NameUnnamedConnections {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        Ok(over(input.generated, self, WalkMode::Permuted, self.name()))
    }

    fn name(&self) -> &'static str {
        "NameUnnamedConnections"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Connection, Direction, Fate, ParticleNode, ViewNode};
    use crate::strategies::fixtures::{run, transform};

    fn unnamed(direction: Option<Direction>, view: usize) -> Connection {
        Connection {
            name: None,
            direction,
            view_type: None,
            tags: vec![],
            view: Some(view),
        }
    }

    /// `Upper` with one unnamed connection bound to a typed `map` view.
    fn authored(direction: Option<Direction>) -> Recipe {
        let mut recipe = Recipe::default();
        let view = recipe.add_view(ViewNode {
            id: Some("greeting".into()),
            view_type: Some(ViewType::entity("Text")),
            ..ViewNode::with_fate(Fate::Map)
        });
        recipe.particles.push(ParticleNode {
            name: Some("Upper".into()),
            connections: vec![unnamed(direction, view)],
            ..ParticleNode::default()
        });
        recipe.attach_spec(0, &transform("Upper", &[]));
        recipe
    }

    #[tokio::test]
    async fn test_direction_picks_the_spec_connection() {
        let recipe = authored(Some(Direction::In));
        assert_eq!(recipe.particles[0].connections.len(), 3);
        assert!(!recipe.is_resolved());

        let out = run(&NameUnnamedConnections, 1, vec![recipe]).await;
        assert_eq!(out.len(), 1);
        let particle = &out[0].recipe.particles[0];
        let names: Vec<_> = particle.connections.iter().map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec![Some("input"), Some("output")]);
        assert_eq!(particle.connections[0].view, Some(0));
        assert_eq!(particle.connections[0].view_type, Some(ViewType::entity("Text")));
        assert_eq!(out[0].score, 1.0);
    }

    #[tokio::test]
    async fn test_undirected_connection_yields_each_fit() {
        let out = run(&NameUnnamedConnections, 1, vec![authored(None)]).await;
        let mut named: Vec<_> = out
            .iter()
            .map(|d| d.recipe.particles[0].connections[0].name.clone().unwrap())
            .collect();
        named.sort();
        assert_eq!(named, vec!["input", "output"]);
        for descendant in &out {
            assert_eq!(descendant.recipe.particles[0].connections.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_two_unnamed_connections_never_share_a_name() {
        let mut recipe = authored(None);
        let second = recipe.add_view(ViewNode::default());
        recipe.particles[0].connections.push(unnamed(None, second));

        let out = run(&NameUnnamedConnections, 1, vec![recipe]).await;
        assert_eq!(out.len(), 2);
        for descendant in &out {
            let particle = &descendant.recipe.particles[0];
            assert_eq!(particle.connections.len(), 2);
            assert_ne!(particle.connections[0].name, particle.connections[1].name);
            assert_eq!(descendant.score, 2.0);
        }
    }

    #[tokio::test]
    async fn test_named_and_specless_particles_are_skipped() {
        let mut specless = Recipe::default();
        specless.add_view(ViewNode::default());
        specless.particles.push(ParticleNode {
            verb: Some("shout".into()),
            connections: vec![unnamed(None, 0)],
            ..ParticleNode::default()
        });
        let named = {
            let mut recipe = Recipe::default();
            recipe.particles.push(ParticleNode::from_spec(&transform("Upper", &[])));
            recipe
        };
        let mismatched = {
            let mut recipe = authored(Some(Direction::In));
            recipe.views[0].view_type = Some(ViewType::entity("Number"));
            recipe.particles[0].connections[0].view_type = None;
            recipe
        };
        for recipe in [specless, named, mismatched] {
            assert!(run(&NameUnnamedConnections, 1, vec![recipe]).await.is_empty());
        }
    }
}
