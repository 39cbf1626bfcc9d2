// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::Descendant;
use crate::errors::PlanningError;
use crate::recipe::{Fate, Recipe, RecipeWalker, Visit, WalkMode};
use crate::strategies::over;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;

/// Gives id-less `?` views the fate `create`.
///
/// A view both read and written scores +1. A view only read scores 0 and
/// one only written scores -1. One-sided views with connections of unknown
/// direction are left for later.
pub struct CreateViews;

impl RecipeWalker for CreateViews {
    fn on_view(&self, recipe: &Recipe, view: usize) -> Visit {
        let node = &recipe.views[view];
        if node.id.is_some() || node.fate != Fate::Unresolved {
            return Visit::Skip;
        }
        let counts = recipe.direction_counts(view);
        let mut score = 1.0;
        if counts.reads == 0 || counts.writes == 0 {
            if counts.unknown > 0 {
                return Visit::Skip;
            }
            score = if counts.reads == 0 { -1.0 } else { 0.0 };
        }
        Visit::one(move |recipe: &mut Recipe| {
            recipe.views[view].fate = Fate::Create;
            score
        })
    }
}

#[async_trait]
impl Strategy for CreateViews {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        Ok(over(input.generated, self, WalkMode::Permuted, self.name()))
    }

    fn name(&self) -> &'static str {
        "CreateViews"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{ParticleNode, ViewNode};
    use crate::strategies::fixtures::{run, transform};

    fn recipe(bindings: &[(usize, usize)], views: usize) -> Recipe {
        let mut recipe = Recipe::default();
        recipe.particles.push(ParticleNode::from_spec(&transform("A", &[])));
        recipe.particles.push(ParticleNode::from_spec(&transform("B", &[])));
        for _ in 0..views {
            recipe.add_view(ViewNode::default());
        }
        for (index, (particle, connection)) in bindings.iter().enumerate() {
            recipe.connect(*particle, *connection, index.min(views - 1));
        }
        recipe
    }

    #[tokio::test]
    async fn test_scores_by_direction() {
        let cases = [
            ("read and written", vec![(0, 1), (1, 0)], 1, 1.0),
            ("only read", vec![(0, 0)], 1, 0.0),
            ("only written", vec![(0, 1)], 1, -1.0),
        ];
        for (label, bindings, views, expected) in cases {
            let out = run(&CreateViews, 1, vec![recipe(&bindings, views)]).await;
            assert_eq!(out.len(), 1, "{}", label);
            assert_eq!(out[0].recipe.views[0].fate, Fate::Create, "{}", label);
            assert_eq!(out[0].score, expected, "{}", label);
        }
    }

    #[tokio::test]
    async fn test_views_are_created_together() {
        let out = run(&CreateViews, 1, vec![recipe(&[(0, 0), (0, 1)], 2)]).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].recipe.views.iter().all(|v| v.fate == Fate::Create));
        assert_eq!(out[0].score, -1.0);
    }

    #[tokio::test]
    async fn test_unknown_directions_wait() {
        let mut open = recipe(&[(0, 0)], 1);
        open.particles[0].connections[0].direction = None;
        assert!(run(&CreateViews, 1, vec![open]).await.is_empty());

        let mut bound = recipe(&[(0, 0)], 1);
        bound.views[0].id = Some("ctx:view0".into());
        assert!(run(&CreateViews, 1, vec![bound]).await.is_empty());
    }
}
