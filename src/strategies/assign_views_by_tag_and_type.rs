// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::Descendant;
use crate::errors::PlanningError;
use crate::recipe::{Fate, Recipe, RecipeWalker, Update, Visit, WalkMode};
use crate::runtime::Context;
use crate::strategies::over;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;
use std::sync::Arc;

/// Binds id-less `use` and `?` views to context views of the same type that
/// carry all of the view's tags. Context views the recipe already binds are
/// not offered again.
pub struct AssignViewsByTagAndType {
    context: Arc<Context>,
}

impl AssignViewsByTagAndType {
    pub fn new(context: Arc<Context>) -> Self {
        Self { context }
    }
}

struct AssignWalker<'a> {
    context: &'a Context,
}

impl RecipeWalker for AssignWalker<'_> {
    fn on_view(&self, recipe: &Recipe, view: usize) -> Visit {
        let node = &recipe.views[view];
        if node.id.is_some() || !matches!(node.fate, Fate::Use | Fate::Unresolved) {
            return Visit::Skip;
        }
        let Some(view_type) = &node.view_type else {
            return Visit::Skip;
        };
        let tags: Vec<String> = node
            .tags
            .iter()
            .chain(
                recipe
                    .view_connections(view)
                    .into_iter()
                    .flat_map(|(p, c)| recipe.particles[p].connections[c].tags.iter()),
            )
            .cloned()
            .collect();

        let updates: Vec<Update> = self
            .context
            .views_matching(view_type, &tags)
            .into_iter()
            .filter(|stored| !recipe.views.iter().any(|v| v.id.as_ref() == Some(&stored.id)))
            .map(|stored| {
                let id = stored.id;
                let score = if tags.is_empty() { 1.0 } else { 2.0 };
                Box::new(move |recipe: &mut Recipe| {
                    recipe.views[view].id = Some(id.clone());
                    score
                }) as Update
            })
            .collect();
        Visit::Propose(updates)
    }
}

#[async_trait]
impl Strategy for AssignViewsByTagAndType {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        let walker = AssignWalker {
            context: &self.context,
        };
        Ok(over(input.generated, &walker, WalkMode::Permuted, self.name()))
    }

    fn name(&self) -> &'static str {
        "AssignViewsByTagAndType"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Catalog, ParticleNode, ViewNode, ViewType};
    use crate::strategies::fixtures::{context, run, transform};

    fn recipe(fate: Fate, tags: &[&str]) -> Recipe {
        let mut recipe = Recipe::default();
        recipe.particles.push(ParticleNode::from_spec(&transform("Upper", &[])));
        let view = recipe.add_view(ViewNode {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..ViewNode::with_fate(fate)
        });
        recipe.connect(0, 0, view);
        recipe
    }

    #[tokio::test]
    async fn test_binds_by_type_and_tags() {
        let context = context(Catalog::default());
        let plain = context.create_view(ViewType::entity("Text"), Some("plain".into()), vec![]);
        let tagged = context.create_view(
            ViewType::entity("Text"),
            Some("tagged".into()),
            vec!["greeting".into()],
        );
        context.create_view(ViewType::entity("Number"), None, vec![]);
        let strategy = AssignViewsByTagAndType::new(Arc::clone(&context));

        let out = run(&strategy, 1, vec![recipe(Fate::Unresolved, &[])]).await;
        let mut ids: Vec<String> = out.iter().filter_map(|d| d.recipe.views[0].id.clone()).collect();
        ids.sort();
        let mut expected = vec![plain.clone(), tagged.clone()];
        expected.sort();
        assert_eq!(ids, expected);
        assert!(out.iter().all(|d| d.recipe.views[0].fate == Fate::Unresolved));

        let out = run(&strategy, 1, vec![recipe(Fate::Use, &["greeting"])]).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].recipe.views[0].id.as_deref(), Some(tagged.as_str()));
        assert_eq!(out[0].score, 2.0);

        assert!(run(&strategy, 1, vec![recipe(Fate::Create, &[])]).await.is_empty());
        context.stop();
    }

    #[tokio::test]
    async fn test_already_bound_views_are_not_offered() {
        let context = context(Catalog::default());
        let only = context.create_view(ViewType::entity("Text"), None, vec![]);
        let strategy = AssignViewsByTagAndType::new(Arc::clone(&context));

        let mut recipe = recipe(Fate::Unresolved, &[]);
        let bound = recipe.add_view(ViewNode {
            id: Some(only),
            ..ViewNode::with_fate(Fate::Map)
        });
        recipe.connect(0, 1, bound);

        assert!(run(&strategy, 1, vec![recipe]).await.is_empty());
        context.stop();
    }
}
