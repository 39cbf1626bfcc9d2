// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::strategizer::Descendant;
use crate::errors::PlanningError;
use crate::recipe::{Catalog, ParticleNode, Recipe, RecipeWalker, Visit, WalkMode};
use crate::strategies::over;
use crate::traits::{Strategy, StrategyInput};
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves the first unresolved search token per generation: one descendant
/// per catalog particle whose name or verb matches it. A token nothing
/// matches is moved to the ignored list.
pub struct SearchTokensToParticles {
    catalog: Arc<Catalog>,
}

impl SearchTokensToParticles {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

struct TokenWalker<'a> {
    catalog: &'a Catalog,
}

impl RecipeWalker for TokenWalker<'_> {
    fn on_recipe(&self, recipe: &Recipe) -> Visit {
        let Some(token) = recipe
            .search
            .as_ref()
            .and_then(|search| search.unresolved_tokens.first())
            .cloned()
        else {
            return Visit::Skip;
        };

        let matches: Vec<ParticleNode> = self
            .catalog
            .for_token(&token)
            .map(ParticleNode::from_spec)
            .collect();
        if matches.is_empty() {
            return Visit::one(move |recipe: &mut Recipe| {
                if let Some(search) = recipe.search.as_mut() {
                    search.unresolved_tokens.retain(|t| t != &token);
                    search.ignored_tokens.push(token.clone());
                }
                0.0
            });
        }

        Visit::Propose(
            matches
                .into_iter()
                .map(|particle| {
                    let token = token.clone();
                    Box::new(move |recipe: &mut Recipe| {
                        recipe.particles.push(particle.clone());
                        if let Some(search) = recipe.search.as_mut() {
                            search.unresolved_tokens.retain(|t| t != &token);
                            search.resolved_tokens.push(token.clone());
                        }
                        1.0
                    }) as crate::recipe::Update
                })
                .collect(),
        )
    }
}

#[async_trait]
impl Strategy for SearchTokensToParticles {
    async fn generate(&self, input: &StrategyInput<'_>) -> Result<Vec<Descendant>, PlanningError> {
        let walker = TokenWalker {
            catalog: &self.catalog,
        };
        Ok(over(input.generated, &walker, WalkMode::Independent, self.name()))
    }

    fn name(&self) -> &'static str {
        "SearchTokensToParticles"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::fixtures::{catalog, run, transform};

    #[tokio::test]
    async fn test_token_matches_by_name_or_verb() {
        let strategy = SearchTokensToParticles::new(catalog(vec![
            transform("Upper", &["shout"]),
            transform("Loud", &["shout"]),
            transform("Reverse", &[]),
        ]));

        let out = run(&strategy, 1, vec![Recipe::with_search("shout reverse")]).await;
        let names: Vec<&str> = out.iter().map(|d| d.recipe.particles[0].display_name()).collect();
        assert_eq!(names, vec!["Upper", "Loud"]);
        for descendant in &out {
            let search = descendant.recipe.search.as_ref().unwrap();
            assert_eq!(search.resolved_tokens, vec!["shout"]);
            assert_eq!(search.unresolved_tokens, vec!["reverse"]);
            assert_eq!(descendant.score, 1.0);
        }

        let next = run(&strategy, 2, vec![out[0].recipe.clone()]).await;
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].recipe.particles.len(), 2);
        assert!(next[0].recipe.search.as_ref().unwrap().is_resolved());
    }

    #[tokio::test]
    async fn test_unmatched_token_is_ignored() {
        let strategy = SearchTokensToParticles::new(catalog(vec![transform("Upper", &[])]));
        let out = run(&strategy, 1, vec![Recipe::with_search("please")]).await;
        assert_eq!(out.len(), 1);
        let search = out[0].recipe.search.as_ref().unwrap();
        assert!(search.is_resolved());
        assert!(!search.contributed());
        assert_eq!(search.ignored_tokens, vec!["please"]);
        assert!(out[0].recipe.particles.is_empty());

        assert!(run(&strategy, 1, vec![Recipe::default()]).await.is_empty());
    }
}
